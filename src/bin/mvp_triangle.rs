fn main() -> std::process::ExitCode {
    tutorial_core::run_from_args(tutorial_core::Tutorial::MvpTriangle)
}
