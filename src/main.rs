// region:    --- Imports
use marketplace_service::clock::{Clock, SystemClock};
use marketplace_service::config::Config;
use marketplace_service::database::memory::MemoryStore;
use marketplace_service::database::postgres::PgStore;
use marketplace_service::database::Store;
use marketplace_service::event_store::OutboxRelay;
use marketplace_service::handlers;
use marketplace_service::message_broker::{EventPublisher, LogPublisher};
use marketplace_service::scheduler::MarketScheduler;
use marketplace_service::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::load()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 저장소 생성 및 초기화
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pg = PgStore::connect(url, config.database_max_connections).await?;
            if let Err(e) = pg.initialize_database().await {
                error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> 데이터베이스 초기화 성공", "Main");
            Arc::new(pg)
        }
        None => {
            warn!(
                "{:<12} --> DATABASE_URL 미설정: 메모리 저장소로 실행 (재시작 시 데이터 유실)",
                "Main"
            );
            Arc::new(MemoryStore::new())
        }
    };

    // 메시지 발행자 생성
    let publisher = create_publisher(&config).await?;

    // 아웃박스 발행을 포함한 스케줄러 시작
    let relay = Arc::new(OutboxRelay::new(
        Arc::clone(&store),
        publisher,
        Arc::clone(&clock),
        config.outbox_batch_size,
    ));
    MarketScheduler::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        relay,
        config.scheduler_interval,
    )
    .start();

    // 라우터 설정
    let routes_all = handlers::routes(AppState::new(store, clock));

    // 리스너 생성
    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}

#[cfg(feature = "kafka")]
async fn create_publisher(
    config: &Config,
) -> Result<Arc<dyn EventPublisher>, Box<dyn std::error::Error>> {
    use marketplace_service::event_store::{EVENTS_TOPIC, NOTIFICATIONS_TOPIC};
    use marketplace_service::message_broker::KafkaManager;

    let Some(brokers) = &config.kafka_brokers else {
        warn!("{:<12} --> KAFKA_BROKERS 미설정: 로그 발행자 사용", "Main");
        return Ok(Arc::new(LogPublisher));
    };

    // Kafka 매니저 생성 및 토픽 생성
    let kafka_manager = KafkaManager::new(brokers)?;
    kafka_manager.create_topic(EVENTS_TOPIC, 5, 1).await?;
    kafka_manager.create_topic(NOTIFICATIONS_TOPIC, 5, 1).await?;
    info!("{:<12} --> Kafka 초기화 성공", "Main");
    Ok(kafka_manager.get_producer())
}

#[cfg(not(feature = "kafka"))]
async fn create_publisher(
    config: &Config,
) -> Result<Arc<dyn EventPublisher>, Box<dyn std::error::Error>> {
    if config.kafka_brokers.is_some() {
        warn!(
            "{:<12} --> kafka 기능 없이 빌드됨: KAFKA_BROKERS 무시, 로그 발행자 사용",
            "Main"
        );
    }
    Ok(Arc::new(LogPublisher))
}
// endregion: --- Main
