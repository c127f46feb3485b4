//! Extract subtitles from a URL and print the text.
//!
//! Usage: cargo run --example basic -- https://example.com/video

#[tokio::main]
async fn main() -> subtext::Result<()> {
    let url = std::env::args()
        .nth(1)
        .expect("usage: basic <video-url>");

    let subs = subtext::extract_subtitles(&url).await?;

    println!("{}", subs.text);

    Ok(())
}
