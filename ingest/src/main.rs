mod stream;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bzip2::bufread::MultiBzDecoder;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use stream::{PageBlock, PageFramer};
use wikiseek_core::index::{index_article, save_page};
use wikiseek_core::page::{Article, Page};
use wikiseek_core::RATE_INTERVAL;

#[derive(Parser)]
#[command(name = "wikiseek-ingest")]
#[command(about = "Stream a MediaWiki dump into the page store and inverted index", long_about = None)]
struct Args {
    /// Path to the bzip2-compressed 'pages-articles' XML dump
    #[arg(long = "dump_path")]
    dump_path: PathBuf,
    /// Directory receiving the page store and index
    #[arg(long = "save_path")]
    save_path: PathBuf,
    /// Line number to resume from, as logged on shutdown
    #[arg(long, default_value_t = 0)]
    resume: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    if !args.dump_path.to_string_lossy().ends_with(".xml.bz2") {
        bail!("dump_path must be a bzip2 compressed 'pages-articles' XML file");
    }

    info!(dump_path = %args.dump_path.display(), "starting stream of wikipedia dump");

    let last_page_start = Arc::new(AtomicU64::new(0));

    {
        let last = Arc::clone(&last_page_start);
        tokio::spawn(async move {
            wait_for_signal().await;
            info!(
                line_num = last.load(Ordering::SeqCst),
                "received signal to stop; last page start line (use --resume)"
            );
            std::process::exit(0);
        });
    }

    let (tx, mut rx) = mpsc::channel::<PageBlock>(1);
    let reader = {
        let dump_path = args.dump_path.clone();
        let resume = args.resume;
        let last = Arc::clone(&last_page_start);
        tokio::task::spawn_blocking(move || -> Result<()> {
            let fh = File::open(&dump_path)
                .with_context(|| format!("failed to open dump file {}", dump_path.display()))?;
            let decoder = MultiBzDecoder::new(BufReader::new(fh));
            let mut framer = PageFramer::new(BufReader::with_capacity(64 * 1024, decoder), resume);
            while let Some(block) = framer.next_page()? {
                last.store(block.start_line, Ordering::SeqCst);
                if tx.blocking_send(block).is_err() {
                    break;
                }
            }
            Ok(())
        })
    };

    // one article release per tick; non-articles are filtered before the tick
    // and never consume one
    let mut ticker = tokio::time::interval(RATE_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    while let Some(block) = rx.recv().await {
        let decoded = tokio::task::spawn_blocking(move || decode_block(block)).await?;
        let Some((article, raw_xml)) = decoded else {
            continue;
        };
        ticker.tick().await;
        let save_path = args.save_path.clone();
        tokio::task::spawn_blocking(move || persist_article(&save_path, article, raw_xml)).await?;
    }

    if let Err(err) = reader.await? {
        error!(
            line_num = last_page_start.load(Ordering::SeqCst),
            "failed to scan dump file; last page start line (use --resume)"
        );
        return Err(err);
    }
    Ok(())
}

/// Decodes a framed block and applies the article filter. Returns `None` for
/// non-articles (silently) and for blocks that fail to decode (logged).
fn decode_block(block: PageBlock) -> Option<(Article, Vec<u8>)> {
    let text = String::from_utf8_lossy(&block.xml);
    let page = match Page::from_xml(&text) {
        Ok(page) => page,
        Err(err) => {
            error!(start_line = block.start_line, %err, "failed to parse page");
            return None;
        }
    };
    let article = page.into_article()?;
    Some((article, block.xml))
}

/// Saves the raw page and indexes its text. Failures are logged and the page
/// skipped; the pipeline moves on to the next one.
fn persist_article(save_path: &Path, article: Article, raw_xml: Vec<u8>) {
    let rel_path = match save_page(save_path, &article.title, &raw_xml) {
        Ok(rel) => rel,
        Err(err) => {
            error!(title = %article.title, %err, "failed to save page");
            return;
        }
    };
    info!(title = %article.title, %rel_path, "saved page");
    if let Err(err) = index_article(save_path, &rel_path, &article.body) {
        error!(title = %article.title, %err, "failed to index page");
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to install interrupt handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => error!(%err, "failed to install terminate handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
