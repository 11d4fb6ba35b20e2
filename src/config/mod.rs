mod settings;

pub use settings::{
    Command, Config, HookSettings, OutputFormat, OutputSettings, ScanSettings, Settings,
};
