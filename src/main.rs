use auricle::{BackgroundListener, Microphone, RecognizerConfig, Segmenter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    tracing::info!("starting background phrase listener on the default microphone");

    let segmenter = Segmenter::new(RecognizerConfig::default())?;
    let mic = Microphone::new(1024);

    let handle = BackgroundListener::start(segmenter, mic, |result| match result {
        Ok(audio) => tracing::info!(duration = audio.duration() as f64, "phrase captured"),
        Err(err) => tracing::warn!(error = %err, "audio source error"),
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("stopping listener");
    if let Some(err) = handle.stop() {
        tracing::warn!(error = %err, "listener stopped with an error");
    }

    Ok(())
}
