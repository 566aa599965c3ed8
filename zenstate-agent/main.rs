use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use zenstate::common::RecordedWrite;
use zenstate::{
    apply_pstate_edit, describe, set_c6, C6Report, DryRunTransport, Listing, MsrTransport,
    MutationReport, PStateEdit, RegisterTransport, Request, Step, ZenstateError,
};

#[derive(Parser, Debug)]
#[command(name = "zenstate")]
#[command(about = "Sets P-States and C6 for AMD Zen processors")]
struct Args {
    #[arg(short, long, help = "List all P-States and the C6 state")]
    list: bool,

    #[arg(
        short,
        long,
        value_parser = clap::value_parser!(u8).range(0..8),
        help = "P-State to set (0-7)"
    )]
    pstate: Option<u8>,

    #[arg(long, help = "Enable P-State")]
    enable: bool,

    #[arg(long, help = "Disable P-State")]
    disable: bool,

    #[arg(short, long, value_parser = parse_hex_u8, help = "FID to set (in hex)")]
    fid: Option<u8>,

    #[arg(short, long, value_parser = parse_hex_u8, help = "DID to set (in hex)")]
    did: Option<u8>,

    #[arg(short, long, value_parser = parse_hex_u8, help = "VID to set (in hex)")]
    vid: Option<u8>,

    #[arg(long, help = "vCore to set (in volts, overrides --vid)")]
    vcore: Option<f64>,

    #[arg(long, help = "Enable C-State C6")]
    c6_enable: bool,

    #[arg(long, help = "Disable C-State C6")]
    c6_disable: bool,

    #[arg(long, help = "CPU to list registers from (defaults to the first CPU)")]
    cpu: Option<u32>,

    #[arg(long, help = "Print the listing as JSON")]
    json: bool,

    #[arg(long, help = "Show the register writes without performing them")]
    dry_run: bool,

    #[arg(long, help = "Enable verbose logging (shows all MSR read/write operations)")]
    verbose: bool,
}

impl From<Args> for Request {
    fn from(args: Args) -> Self {
        Request {
            list: args.list,
            cpu: args.cpu,
            pstate: args.pstate.map(usize::from),
            edit: PStateEdit {
                enable: args.enable,
                disable: args.disable,
                fid: args.fid,
                did: args.did,
                vid: args.vid,
                vcore: args.vcore,
            },
            c6_enable: args.c6_enable,
            c6_disable: args.c6_disable,
            json: args.json,
            dry_run: args.dry_run,
        }
    }
}

/// Parse an 8-bit hex value, with or without a `0x` prefix
fn parse_hex_u8(s: &str) -> Result<u8, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(digits, 16).map_err(|e| format!("'{s}' is not an 8-bit hex value: {e}"))
}

fn check_permissions() {
    // SAFETY: geteuid has no preconditions and always succeeds
    if unsafe { libc::geteuid() } != 0 {
        tracing::warn!("Not running as root, MSR access will most likely be denied");
    }
}

fn print_mutation(report: &MutationReport) {
    println!("Current P{}: {}", report.index, describe(&report.before_def()));
    for change in &report.changes {
        println!("{change}");
    }
    if report.tsc_lock_applied {
        println!("Locking TSC frequency");
    }
    if report.written {
        println!("New P{}: {}", report.index, describe(&report.after_def()));
    }
}

fn print_c6(report: &C6Report) {
    tracing::debug!(
        "C6 package 0x{:016x} -> 0x{:016x}, core 0x{:016x} -> 0x{:016x}",
        report.package_before,
        report.package_after,
        report.core_before,
        report.core_after
    );
    if report.enable {
        println!("Enabling C6 state");
    } else {
        println!("Disabling C6 state");
    }
}

fn print_dry_run(writes: &[RecordedWrite]) {
    println!("Dry run, {} register writes withheld:", writes.len());
    for write in writes {
        println!(
            "  CPU {:>3} MSR 0x{:08X} <- 0x{:016X}",
            write.cpu, write.address, write.value
        );
    }
}

/// Run every requested action in order: list, P-State edit, C6 enable, C6 disable
fn run<T: RegisterTransport + ?Sized>(transport: &T, request: &Request) -> anyhow::Result<()> {
    if request.list {
        let cpu = request.cpu.unwrap_or_else(|| transport.primary_cpu());
        let listing = Listing::capture(transport, cpu)
            .with_context(|| format!("Failed to list registers on CPU {cpu}"))?;
        if request.json {
            println!("{}", listing.to_json()?);
        } else {
            println!("{listing}");
        }
    }

    if let Some(index) = request.pstate {
        let report = apply_pstate_edit(transport, index, &request.edit)
            .inspect_err(|e| {
                if let Some(partial) = e.partial_report() {
                    print_mutation(partial);
                }
            })
            .with_context(|| format!("Failed to set P{index}"))?;
        print_mutation(&report);
    }

    if request.c6_enable {
        let report = set_c6(transport, true).context("Failed to enable C6")?;
        print_c6(&report);
    }

    if request.c6_disable {
        let report = set_c6(transport, false).context("Failed to disable C6")?;
        print_c6(&report);
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup logging based on verbose flag; RUST_LOG takes precedence
    let log_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let request = Request::from(args);
    if !request.has_action() {
        Args::command().print_help()?;
        return Ok(());
    }
    tracing::debug!("Request: {}", serde_json::to_string(&request)?);

    check_permissions();

    zenstate::common::detect_architecture();

    let transport = MsrTransport::open().map_err(ZenstateError::access(Step::Discover))?;

    if request.dry_run {
        let transport = DryRunTransport::new(transport);
        run(&transport, &request)?;
        print_dry_run(&transport.writes());
    } else {
        run(&transport, &request)?;
    }

    Ok(())
}
