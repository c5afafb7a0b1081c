use ctx_log_bridge::alarm::{try_send_alarm_markdown, MarkdownContent};
use ctx_log_bridge::env::env_or;
use ctx_log_bridge::{init_global, LoggerConfig};

#[tokio::main]
async fn main() {
    init_global(&LoggerConfig::default());

    let url = env_or("ALARM_WEBHOOK", "http://127.0.0.1:8080/cgi-bin/webhook/send?key=demo");
    let content = MarkdownContent::new(
        "## Match server down\n> node: <font color=\"warning\">battle-3</font>\n> players affected: 128",
    );

    try_send_alarm_markdown(&url, 3, &content).await;

    ctx_log_bridge::close();
}
