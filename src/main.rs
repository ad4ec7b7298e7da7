use anyhow::{bail, Context, Result};
use mlslcs::config::{ConfigManager, LcsConfig, UpdateAlgorithm};
use mlslcs::data::{Dataset, Representation};
use mlslcs::engines::generation::ConsoleProgressCallback;
use mlslcs::engines::update::UpdateStrategy;
use mlslcs::engines::Learner;
use std::sync::Arc;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("--print-config") {
        print!("{}", toml::to_string_pretty(&LcsConfig::default())?);
        return Ok(());
    }
    if args.len() < 3 || args.len() > 4 {
        bail!(
            "usage: {0} <config.toml> <instances.json> [population-out.json]\n       {0} --print-config",
            args[0]
        );
    }

    let manager = ConfigManager::new();
    manager
        .load_layered(&args[1])
        .with_context(|| format!("loading configuration from {}", args[1]))?;
    let config = manager.get();

    let dataset = Dataset::load(&args[2]).with_context(|| format!("loading instances from {}", args[2]))?;
    let representation: Arc<dyn Representation> = Arc::new(dataset.representation(&config.representation)?);
    let instances = Arc::new(dataset.instances()?);
    let output = args.get(3).map(String::as_str);

    match config.update.algorithm {
        UpdateAlgorithm::Mlslcs => run(Learner::mlslcs(config, representation, instances)?, output),
        UpdateAlgorithm::Slcs => run(Learner::slcs(config, representation, instances)?, output),
    }
}

fn run<U: UpdateStrategy + 'static>(mut learner: Learner<U>, output: Option<&str>) -> Result<()> {
    learner.train(&mut ConsoleProgressCallback)?;
    print!("{}", learner.dump());
    if let Some(path) = output {
        learner
            .save_population(path)
            .with_context(|| format!("saving population to {}", path))?;
    }
    Ok(())
}
