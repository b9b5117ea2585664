use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_rebuild_is_alias_for_reset() {
    let cli = Cli::try_parse_from(["tern", "--database", "app.db", "run", "--rebuild"]).unwrap();
    match cli.command {
        Commands::Run(args) => assert!(args.reset),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "tern", "status", "--backend", "duckdb", "-m", "db/migrations", "-o", "json",
    ])
    .unwrap();
    assert_eq!(cli.global.backend, Some(Backend::Duckdb));
    assert_eq!(cli.global.migrations_dir.as_deref(), Some("db/migrations"));
    match cli.command {
        Commands::Status(args) => assert_eq!(args.output, StatusOutput::Json),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_timeout_parses_seconds() {
    let cli = Cli::try_parse_from(["tern", "run", "--timeout", "30"]).unwrap();
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.timeout, Some(30));
            assert!(!args.reset);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_backend_maps_to_db_type() {
    assert_eq!(DbType::from(Backend::Sqlite), DbType::Sqlite);
    assert_eq!(DbType::from(Backend::Duckdb), DbType::DuckDb);
}
