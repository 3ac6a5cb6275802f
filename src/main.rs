use clap::Parser;
use keeper::cli::commands;
use keeper::cli::{AuthAction, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    keeper::logging::init(cli.verbose);

    let result = match cli.command {
        Commands::AddCard {
            ref name,
            ref number,
            ref holder,
            ref expiry,
            ref cvv,
            ref meta,
        } => commands::add_card::execute(
            &cli,
            name,
            number,
            holder,
            expiry,
            cvv.as_deref(),
            meta.as_deref(),
        ),
        Commands::AddText {
            ref name,
            ref content,
            ref meta,
        } => commands::add_text::execute(&cli, name, content.as_deref(), meta.as_deref()),
        Commands::AddBinary {
            ref name,
            ref file,
            ref meta,
        } => commands::add_binary::execute(&cli, name, file, meta.as_deref()),
        Commands::AddCredentials {
            ref name,
            ref username,
            ref password,
            ref meta,
        } => commands::add_credentials::execute(
            &cli,
            name,
            username,
            password.as_deref(),
            meta.as_deref(),
        ),
        Commands::List { ref kind } => commands::list::execute(&cli, kind.as_deref()),
        Commands::Get {
            ref kind,
            ref name,
            remote,
            ref output,
        } => commands::get::execute(&cli, kind, name, remote, output.as_deref()),
        Commands::Delete {
            ref kind,
            ref name,
            remote,
            force,
        } => commands::delete::execute(&cli, kind, name, remote, force),
        Commands::Sync {
            ref strategy,
            ref kind,
            deadline,
        } => commands::sync::execute(&cli, strategy.as_deref(), kind.as_deref(), deadline),
        Commands::Pull { ref kind } => commands::pull::execute(&cli, kind.as_deref()),
        Commands::Keygen { ref out, bits } => commands::keygen::execute(&cli, out.as_deref(), bits),
        Commands::Auth { ref action } => match action {
            AuthAction::SaveToken => commands::auth::execute_save(&cli),
            AuthAction::ForgetToken => commands::auth::execute_forget(&cli),
        },
        Commands::Completions { ref shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        keeper::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
