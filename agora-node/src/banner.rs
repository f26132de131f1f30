use console::Style;

const BANNER: &str = r#"
  █████╗   ██████╗   ██████╗  ██████╗   █████╗
 ██╔══██╗ ██╔════╝  ██╔═══██╗ ██╔══██╗ ██╔══██╗
 ███████║ ██║  ███╗ ██║   ██║ ██████╔╝ ███████║
 ██╔══██║ ██║   ██║ ██║   ██║ ██╔══██╗ ██╔══██║
 ██║  ██║ ╚██████╔╝ ╚██████╔╝ ██║  ██║ ██║  ██║
 ╚═╝  ╚═╝  ╚═════╝   ╚═════╝  ╚═╝  ╚═╝ ╚═╝  ╚═╝"#;

/// Print the AGORA startup banner with version info.
pub fn print_banner() {
    let cyan = Style::new().cyan().bold();
    let dim = Style::new().dim();

    println!("{}", cyan.apply_to(BANNER));
    println!(
        "  {}",
        dim.apply_to(format!(
            "v{} deterministic ledger and governance engine",
            env!("CARGO_PKG_VERSION")
        ))
    );
    println!();
}
