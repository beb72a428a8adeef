use clap::Parser;
use miette::Result;
use atelier::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => atelier::cli::commands::init::run(args),
        Commands::Company(cmd) => atelier::cli::commands::company::run(cmd, &global),
        Commands::Project(cmd) => atelier::cli::commands::project::run(cmd, &global),
        Commands::User(cmd) => atelier::cli::commands::user::run(cmd, &global),
        Commands::Team(cmd) => atelier::cli::commands::team::run(cmd, &global),
        Commands::Ms(cmd) => atelier::cli::commands::milestone::run(cmd, &global),
        Commands::Task(cmd) => atelier::cli::commands::task::run(cmd, &global),
        Commands::Insp(cmd) => atelier::cli::commands::inspection::run(cmd, &global),
        Commands::Inv(cmd) => atelier::cli::commands::invoice::run(cmd, &global),
        Commands::Login(args) => atelier::cli::commands::session::run_login(args, &global),
        Commands::Logout => atelier::cli::commands::session::run_logout(&global),
        Commands::Whoami => atelier::cli::commands::session::run_whoami(&global),
        Commands::Status(args) => atelier::cli::commands::status::run(args, &global),
        Commands::Report(cmd) => atelier::cli::commands::report::run(cmd, &global),
        Commands::Backup(cmd) => atelier::cli::commands::backup::run(cmd, &global),
        Commands::Completions(args) => atelier::cli::commands::completions::run(args),
    }
}
