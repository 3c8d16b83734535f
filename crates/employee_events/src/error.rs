use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("broker did not confirm publish to '{exchange}' with key '{routing_key}'")]
    NotConfirmed { exchange: String, routing_key: String },
}
