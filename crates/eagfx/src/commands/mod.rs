pub mod shape;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle shape texture archives
    Shape {
        #[command(subcommand)]
        command: shape::ShapeCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Shape { command } => command.handle(),
        }
    }
}
