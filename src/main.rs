use clap::Parser;
use potmemo::build_collector;
use potmemo::config::{Cli, Config, default_config_path};
use potmemo::error::unpack_error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config_path = args
        .config_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(default_config_path);

    let cfg = Config::new(&config_path.to_string_lossy()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });
    let collector = build_collector(&cfg).unwrap_or_else(|e| {
        tracing::error!(error = %unpack_error(&e), "failed to setup http client");
        std::process::exit(1);
    });
    let opts = cfg.collect_options();
    tracing::info!(notepad = %opts.notepad_title, "potmemo starting");

    let collect_all = async {
        if !args.words.is_empty() {
            for word in &args.words {
                report(collector.collect(word, &opts).await);
            }
            return;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => report(collector.collect(&line, &opts).await),
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read stdin");
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = collect_all => {}
        _ = signal::ctrl_c() => {
            tracing::info!("ctrl+c signal received, flushing pending words");
        }
    }

    match collector.aggregator().flush_now().await {
        Ok(Some(report)) => {
            tracing::info!(notepad_id = %report.notepad_id, words = report.words_flushed, "notepad updated")
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(error = %unpack_error(&e), "failed to update notepad on shutdown");
            std::process::exit(1);
        }
    }
    tracing::info!("potmemo done");
}

fn report(result: potmemo::error::NotepadResult<potmemo::plugin::CollectionResponse>) {
    match result {
        Ok(response) => println!("{}", response.message),
        Err(e) => eprintln!("{}", unpack_error(&e)),
    }
}
