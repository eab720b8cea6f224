use anyhow::{anyhow, Context};
use clap::Parser;
use plugdb::host::image::PluginImage;
use plugdb::host::replay::Machine;
use plugdb::ui::config::{self, UIConfig};
use plugdb::ui::console::print::style::{self, ErrorView, FilePathView};
use plugdb::ui::console::Shell;
use plugdb::{log as pdlog, pd_info};
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Plugin images to load, in load order
    #[clap(required = true)]
    images: Vec<PathBuf>,

    /// Start debugging a plugin given by its number (1-based) or file name,
    /// the plugin halts on its first instruction
    #[clap(short, long, value_name = "#|FILE")]
    debug: Vec<String>,

    /// Halt on the first instruction of the next loaded plugin
    #[clap(long)]
    next: bool,

    /// Add a breakpoint to a debugged plugin: <#|FILE>=<[file:]line|[file:]function>
    #[clap(short, long = "break", value_name = "PLUGIN=LOCATION")]
    breakpoints: Vec<String>,

    /// Print breakpoints of every debugged plugin before running
    #[clap(long)]
    list_breakpoints: bool,

    /// Path to ui config file (default is ~/.config/plugdb/config.toml)
    #[clap(long)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[clap(long)]
    no_color: bool,

    /// Mute debugger engine logs
    #[clap(short, long)]
    quiet: bool,

    /// Log level (off, error, warn, info, debug, trace), overrides RUST_LOG
    #[clap(long, env = "PLUGDB_LOG")]
    log_level: Option<String>,
}

fn add_breakpoints(machine: &mut Machine, breakpoints: &[String]) {
    for arg in breakpoints {
        let result = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("expected <#|FILE>=<location>"))
            .and_then(|(plugin, spec)| {
                let index = machine.manager().find_plugin(plugin)?;
                Ok(machine.add_breakpoint(index, spec.trim())?)
            });

        match result {
            Ok(brkpt) => println!("Added breakpoint {} ({arg})", brkpt.id),
            Err(e) => println!("{}", ErrorView::from(format!("Invalid breakpoint {arg}: {e:#}"))),
        }
    }
}

fn list_breakpoints(machine: &mut Machine) {
    for index in 0..machine.plugin_count() {
        let Ok(views) = machine.list_breakpoints(index) else {
            continue;
        };
        let name = machine.manager().plugin_name(index).unwrap_or_default().to_string();
        println!("Breakpoints of {}:", FilePathView::from(name));
        for view in views {
            println!(
                "{:2}  line: {}{}\tfile: {}\tfunc: {}",
                view.number,
                view.line.unwrap_or_default(),
                if view.is_temporary { "  (TEMP)" } else { "" },
                view.file.unwrap_or_default(),
                view.function.unwrap_or_default(),
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_deref() {
        None => None,
        Some(level) => Some(
            level
                .parse::<log::LevelFilter>()
                .map_err(|_| anyhow!("unknown log level {level}"))?,
        ),
    };
    pdlog::init(level);
    pdlog::set_enabled(!args.quiet);

    let ui_config = UIConfig::from_file(args.config.as_deref());
    let colored = ui_config.color && !args.no_color && std::io::stdout().is_terminal();
    style::set_colored(colored);
    config::set(ui_config);

    let mut machine = Machine::new();
    if args.next {
        machine.manager_mut().debug_next();
    }
    for path in &args.images {
        let image = PluginImage::load(path)
            .with_context(|| format!("load plugin image {}", path.display()))?;
        machine.load(image);
    }

    for plugin in &args.debug {
        let index = machine
            .manager()
            .find_plugin(plugin)
            .with_context(|| format!("plugin {plugin}"))?;
        machine
            .manager_mut()
            .start(index)
            .with_context(|| format!("start debugging {plugin}"))?;
        println!("Pausing plugin {plugin} for debugging. Will halt on next instruction.");
    }

    add_breakpoints(&mut machine, &args.breakpoints);
    if args.list_breakpoints {
        list_breakpoints(&mut machine);
    }

    let mut shell = Shell::terminal(config::current(), colored)?;
    for (index, summary) in machine.run_all(&mut shell).into_iter().enumerate() {
        pd_info!(
            "plugin #{}: {} break events{}",
            index + 1,
            summary.steps,
            if summary.detached { ", debugger detached" } else { "" }
        );
    }

    Ok(())
}
