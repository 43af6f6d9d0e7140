use simple_logger::SimpleLogger;
use sonora_synth::runtime::native;
use sonora_synth::synth::SynthConfig;

fn main() {
    if let Err(e) = SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("Failed to initialize logger: {}", e);
    }

    // Optional JSON config path as the first argument
    let config = match std::env::args().nth(1) {
        Some(path) => match SynthConfig::load(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path);
                config
            }
            Err(e) => {
                log::warn!("Could not load config {}: {}. Using defaults.", path, e);
                SynthConfig::default()
            }
        },
        None => SynthConfig::default(),
    };

    if let Err(e) = native::start(config) {
        log::error!("Synth failed to start: {}", e);
        std::process::exit(1);
    }
}
