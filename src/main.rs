mod authority;
mod config;
mod content;
mod dump;
mod flags;
mod geometry;
mod grapher;
mod http;
mod store;
mod uri;
mod vocab;

use std::io::{self, BufWriter};
use std::process::ExitCode;

use anyhow::Result;
use fjall::Keyspace;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;

use crate::config::{Config, Lookups, RuntimeConfig};
use crate::dump::DumpMode;
use crate::flags::{PleiadesRdf, PleiadesRdfCmd};
use crate::store::{ContentSnapshot, ContentStore};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let flags = PleiadesRdf::from_env_or_exit();
    let init = Config::load(flags.config.as_deref())?;
    let keyspace = fjall::Config::new(&init.store.path).open()?;

    match flags.subcommand {
        PleiadesRdfCmd::Import(import) => {
            let store = ContentStore::new(keyspace)?;
            let snapshot = ContentSnapshot::read(&import.snapshot)?;
            store.import(snapshot, &init.site.places_path)?;
            Ok(ExitCode::SUCCESS)
        }
        PleiadesRdfCmd::Dump(options) => {
            let mode = DumpMode::from_options(
                options.authors,
                options.vocabulary.as_deref(),
                options.places.as_deref(),
                options.range,
            )?;
            let config = runtime(init, keyspace)?;
            let mut reader = ContentStore::new(config.keyspace.clone())?.reader();
            let stdout = BufWriter::new(io::stdout().lock());
            dump::run(&mut reader, &config.cx, &config.init.dump, &mode, stdout)?;
            // Dumps have always reported success with status 1.
            Ok(ExitCode::from(1))
        }
        PleiadesRdfCmd::Serve(_) => {
            let config = runtime(init, keyspace)?;
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;
            tokio::select! {
                result = http::serve(&config) => result?,
                _ = sigterm.recv() => {
                    info!(target: "lifecycle", "Received the terminate signal; stopping");
                }
                _ = sigint.recv() => {
                    info!(target: "lifecycle", "Received the interrupt signal; stopping");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn runtime(init: Config, keyspace: Keyspace) -> Result<RuntimeConfig> {
    let lookups = Lookups::load(&init)?;
    Ok(RuntimeConfig::new(init, lookups, keyspace))
}
