use once_cell::sync::Lazy;
use tokio::sync::mpsc;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

/// Runs `fut` in the background and delivers its output as an event to the
/// owning loop. A closed receiver just drops the result.
pub fn run_async_to_main<T, Fut, F>(tx: &mpsc::UnboundedSender<T>, fut: Fut, wrap: F)
where
    T: Send + 'static,
    Fut: std::future::Future + Send + 'static,
    Fut::Output: Send + 'static,
    F: FnOnce(Fut::Output) -> T + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let out = fut.await;
        let _ = tx.send(wrap(out));
    });
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_adds_scheme_and_strips_slash() {
        assert_eq!(normalize_url(" chat.example.com/ "), "https://chat.example.com");
        assert_eq!(normalize_url("http://localhost:5000/"), "http://localhost:5000");
    }

    #[tokio::test]
    async fn background_result_reaches_receiver() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        run_async_to_main(&tx, async { 21 * 2 }, |n| format!("got {}", n));
        assert_eq!(rx.recv().await.as_deref(), Some("got 42"));
    }
}
