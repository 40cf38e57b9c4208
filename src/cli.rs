use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "avian-journal")]
#[command(about = "A bird photographer's journal: public catalog and admin console")]
#[command(version)]
pub(crate) struct Args {
    /// Use the local SQLite store even when a backend URL is configured
    #[arg(long, global = true)]
    pub local: bool,

    /// Directory for the local store, uploads, session marker and log
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Open the admin console (the default)
    Admin,

    /// List the bird gallery
    Birds {
        /// Match against the English, local and scientific names
        #[arg(short, long, default_value = "")]
        search: String,

        /// Only show birds carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Only show featured birds
        #[arg(short, long)]
        featured: bool,
    },

    /// Show one bird by slug
    Bird { slug: String },

    /// List the events timeline
    Events,

    /// Show one event by slug
    Event { slug: String },

    /// Send a message to the photographer
    Contact {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        message: String,
    },
}

impl Args {
    pub(crate) fn is_admin(&self) -> bool {
        matches!(self.command, None | Some(Command::Admin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_opens_admin() {
        let args = Args::try_parse_from(["avian-journal", "--local"]).unwrap();
        assert!(args.local);
        assert!(args.is_admin());
    }

    #[test]
    fn gallery_flags_parse() {
        let args = Args::try_parse_from([
            "avian-journal",
            "birds",
            "--tag",
            "Raptor",
            "--featured",
            "--data-dir",
            "/tmp/journal",
        ])
        .unwrap();
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/journal")));
        match args.command {
            Some(Command::Birds {
                search,
                tag,
                featured,
            }) => {
                assert_eq!(search, "");
                assert_eq!(tag.as_deref(), Some("Raptor"));
                assert!(featured);
            }
            _ => panic!("expected the birds command"),
        }
    }
}
