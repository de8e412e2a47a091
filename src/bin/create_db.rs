// 创建数据库的简单程序

use std::path::PathBuf;

use pv_test_lib::services::{BaseService, SqliteOrmPersistenceService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    println!("正在创建SQLite数据库...");

    let db_file_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("pv_test_data.sqlite"));
    println!("数据库文件路径: {:?}", db_file_path);

    // 建库并初始化表结构
    let mut persistence_service = SqliteOrmPersistenceService::new(Some(&db_file_path)).await?;
    persistence_service.initialize().await?;
    persistence_service.health_check().await?;

    println!("数据库创建完成！");
    println!("数据库文件位置: {:?}", db_file_path.canonicalize()?);

    Ok(())
}
