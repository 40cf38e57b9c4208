//! Binary entry point: parse the command line, bring up logging and the
//! configured backend, then either print a catalog view or hand the terminal
//! to the admin console.
mod cli;

use std::fs::{self, OpenOptions};
use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Env, Target};

use avian_journal::admin::drafts::ContactForm;
use avian_journal::admin::session::{AdminGate, Session};
use avian_journal::admin::Services;
use avian_journal::catalog::{self, BirdQuery};
use avian_journal::config::{self, Config, Overrides};
use avian_journal::store::Backend;
use avian_journal::{run_app, App};

use crate::cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let overrides = Overrides {
        force_local: args.local,
        data_dir: args.data_dir.clone(),
    };
    init_logging(&args, &overrides)?;

    let config = Config::load(&overrides)?;
    let backend = Backend::connect(&config)?;
    let services = Services::new(&backend, &config);

    let mut out = io::stdout();
    let shown = match args.command {
        None | Some(Command::Admin) => {
            run_admin(services, &config)?;
            true
        }
        Some(Command::Birds {
            search,
            tag,
            featured,
        }) => {
            let query = BirdQuery {
                search,
                tag,
                featured_only: featured,
            };
            catalog::list_birds(&mut out, &services.birds, &query).await?
        }
        Some(Command::Bird { slug }) => catalog::show_bird(&mut out, &services.birds, &slug).await?,
        Some(Command::Events) => catalog::list_events(&mut out, &services.events).await?,
        Some(Command::Event { slug }) => {
            catalog::show_event(&mut out, &services.events, &slug).await?
        }
        Some(Command::Contact {
            name,
            email,
            message,
        }) => catalog::send_contact(
            &mut out,
            &ContactForm {
                name,
                email,
                message,
            },
        )?,
    };

    Ok(if shown {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// `RUST_LOG` filtering with an `info` default. The admin console owns the
/// terminal, so it logs to a file in the data directory instead of stderr.
fn init_logging(args: &Args, overrides: &Overrides) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));

    if args.is_admin() {
        let data_dir = config::resolve_data_dir(overrides)?;
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("could not create {}", data_dir.display()))?;
        let path = config::log_file(&data_dir);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("could not open log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

/// Restore the saved session and run the console until the admin quits.
fn run_admin(services: Services, config: &Config) -> Result<()> {
    let gate = AdminGate::new(config.admin_password.clone());
    let session = Session::load(config.session_file());
    let mut app = App::new(services, gate, session);
    tokio::task::block_in_place(|| run_app(&mut app))
}
