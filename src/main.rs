use color_eyre::eyre::Result;

use orb_vault::search::{Outcome, Puzzle};

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let puzzle = Puzzle::vault()?;
    match puzzle.solve() {
        Outcome::Solved(solution) => {
            println!("{solution}");
            println!("{}", serde_json::to_string_pretty(&solution)?);
        }
        Outcome::Exhausted { generations } => {
            println!("no path satisfies the target (searched {generations} generations)");
        }
    }
    Ok(())
}
