use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db;
use crate::metrics::MetricsCache;
use crate::services::{ChangeFeed, LeadService, run_invalidation_listener};

/// 变更广播通道容量
const CHANGE_FEED_CAPACITY: usize = 256;

/// 服务器状态 - 持有所有共享组件的单例引用
///
/// ServerState 是服务的核心数据结构，使用 Arc 实现浅拷贝，
/// 所有权成本极低。
///
/// # 组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | change_feed | Arc<ChangeFeed> | 资源版本号与变更广播 |
/// | metrics_cache | Arc<MetricsCache> | 版本戳聚合缓存 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 变更事件源 (版本号递增 + 广播)
    pub change_feed: Arc<ChangeFeed>,
    /// 聚合缓存 (版本戳校验，读时验证)
    pub metrics_cache: Arc<MetricsCache>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 通常使用 [`Self::initialize()`] 方法代替
    pub fn new(
        config: Config,
        db: Surreal<Db>,
        jwt_service: Arc<JwtService>,
        change_feed: Arc<ChangeFeed>,
        metrics_cache: Arc<MetricsCache>,
    ) -> Self {
        Self {
            config,
            db,
            jwt_service,
            change_feed,
            metrics_cache,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database)
    /// 3. JWT 服务、变更事件源、聚合缓存
    ///
    /// # Panics
    ///
    /// 工作目录或数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db = db::connect(&config.database_dir())
            .await
            .expect("Failed to initialize database");

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let change_feed = Arc::new(ChangeFeed::new(CHANGE_FEED_CAPACITY));
        let metrics_cache = Arc::new(MetricsCache::new());

        Self::new(config.clone(), db, jwt_service, change_feed, metrics_cache)
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用
    ///
    /// 启动的任务：
    /// - 缓存失效监听器 (合并窗口内的变更风暴只触发一次全量失效)
    pub fn start_background_tasks(&self) {
        let feed = self.change_feed.clone();
        let cache = self.metrics_cache.clone();
        let window = Duration::from_millis(self.config.cache_coalesce_ms);
        tokio::spawn(run_invalidation_listener(feed, cache, window));
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 构造 lead 业务服务 (每次请求轻量创建)
    pub fn lead_service(&self) -> LeadService {
        LeadService::new(self.db.clone(), self.change_feed.clone())
    }
}
