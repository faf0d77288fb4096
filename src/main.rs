use multiwin::{App, Settings};

fn main() -> multiwin::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    App::new(Settings::default()).run()
}
