use std::process::ExitCode;

mod app {
    pub(crate) mod bootstrap;
    pub(crate) mod gameplay;
    pub(crate) mod loop_runner;
}

fn main() -> ExitCode {
    app::loop_runner::run()
}
