// region:    --- Imports
use crate::error::MarketResult;
use async_trait::async_trait;
use tracing::info;

#[cfg(feature = "kafka")]
pub use kafka::{KafkaManager, KafkaProducer};

// endregion: --- Imports

// region:    --- Publisher Trait
/// 메시지 발행자
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> MarketResult<()>;
}

/// 브로커 없이 로그로만 남기는 발행자 (개발용)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> MarketResult<()> {
        info!(
            "{:<12} --> 메시지 발행(로그): topic={}, key={}, payload={}",
            "Producer", topic, key, payload
        );
        Ok(())
    }
}
// endregion: --- Publisher Trait

// region:    --- Kafka
#[cfg(feature = "kafka")]
mod kafka {
    use super::EventPublisher;
    use crate::error::{MarketError, MarketResult};
    use async_trait::async_trait;
    use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
    use rdkafka::client::DefaultClientContext;
    use rdkafka::producer::{FutureProducer, FutureRecord};
    use rdkafka::ClientConfig;
    use std::sync::Arc;
    use std::time::Duration;
    use tracing::{error, info};

    #[derive(Clone)]
    pub struct KafkaProducer {
        producer: Arc<FutureProducer>,
    }

    /// KafkaProducer 구현
    impl KafkaProducer {
        pub fn new(brokers: &str) -> MarketResult<Self> {
            let producer: FutureProducer = ClientConfig::new()
                .set("bootstrap.servers", brokers)
                .set("message.timeout.ms", "5000")
                .set("enable.idempotence", "true")
                .create()
                .map_err(|e| MarketError::Broker(format!("Producer creation error: {e:?}")))?;

            Ok(KafkaProducer {
                producer: Arc::new(producer),
            })
        }
    }

    #[async_trait]
    impl EventPublisher for KafkaProducer {
        /// 메시지 전송
        async fn publish(&self, topic: &str, key: &str, payload: &str) -> MarketResult<()> {
            info!(
                "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
                "Producer", topic, key
            );
            let record = FutureRecord::to(topic).key(key).payload(payload);

            self.producer
                .send(record, Duration::from_secs(0))
                .await
                .map_err(|(e, _)| MarketError::Broker(format!("Error sending message: {e:?}")))?;

            Ok(())
        }
    }

    pub struct KafkaManager {
        producer: Arc<KafkaProducer>,
        brokers: String,
    }

    /// KafkaManager 구현
    impl KafkaManager {
        pub fn new(brokers: &str) -> MarketResult<Self> {
            Ok(KafkaManager {
                producer: Arc::new(KafkaProducer::new(brokers)?),
                brokers: brokers.to_string(),
            })
        }

        /// 프로듀서 반환
        pub fn get_producer(&self) -> Arc<KafkaProducer> {
            Arc::clone(&self.producer)
        }

        /// 토픽 생성 (이미 있으면 브로커가 오류를 돌려주므로 경고만 남긴다)
        pub async fn create_topic(
            &self,
            topic_name: &str,
            num_partitions: i32,
            replication_factor: i32,
        ) -> MarketResult<()> {
            info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Manager", topic_name);

            let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
                .set("bootstrap.servers", &self.brokers)
                .create()
                .map_err(|e| MarketError::Broker(format!("AdminClient 생성 실패: {e:?}")))?;

            let new_topic = NewTopic::new(
                topic_name,
                num_partitions,
                TopicReplication::Fixed(replication_factor),
            );

            match admin_client
                .create_topics(&[new_topic], &AdminOptions::new())
                .await
            {
                Ok(results) => {
                    for result in results {
                        if let Err((topic, code)) = result {
                            tracing::warn!(
                                "{:<12} --> Kafka 토픽 생성 건너뜀: {} ({:?})",
                                "Manager",
                                topic,
                                code
                            );
                        }
                    }
                    info!("{:<12} --> Kafka 토픽 준비 완료: {}", "Manager", topic_name);
                    Ok(())
                }
                Err(e) => {
                    error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Manager", e);
                    Err(MarketError::Broker(format!("토픽 생성 실패: {e:?}")))
                }
            }
        }
    }
}
// endregion: --- Kafka
