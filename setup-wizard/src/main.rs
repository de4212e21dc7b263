fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Non-interactive TUI smoke test mode (for automated checks).
    // Renders a single frame for a specific page and exits 0/1.
    // Usage: --tui-smoke or --tui-smoke=welcome|license|install|done
    if let Some(arg) = args
        .iter()
        .find(|a| a.as_str() == "--tui-smoke" || a.starts_with("--tui-smoke="))
    {
        let target = arg
            .split_once('=')
            .map(|(_, v)| v.to_string())
            .filter(|v| !v.trim().is_empty());
        setup_wizard::run_tui_smoke(target);
        return;
    }

    // Headless install: --unattended --accept-license [--scope user|all] [--overwrite]
    if args.iter().any(|a| a == "--unattended") {
        setup_wizard::run_unattended(&args[1..]);
        return;
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: setup-wizard [--tui | --tui-smoke[=welcome|license|install|done]");
        println!("                    | --unattended --accept-license [--scope user|all] [--overwrite]]");
        return;
    }

    // Default (and --tui): interactive terminal wizard.
    setup_wizard::run_tui();
}
