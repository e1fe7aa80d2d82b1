use std::process::exit;
use tracing_subscriber::EnvFilter;
use verlay::default_proxy;
use verlay_resolver::ResolveError;
use verlay_router::RouterError;

const USAGE: &str = "usage: verlay <tool> [args...] | verlay rehash | verlay prune";

fn init_logging() {
    let filter = EnvFilter::try_from_env("VERLAY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

// Exit with 127 when the command cannot exist, mirroring what a shell does
// for an unknown command.
fn exit_code_for(err: &RouterError) -> i32 {
    match err {
        RouterError::NotInstalled { .. }
        | RouterError::ExecutableNotFound { .. }
        | RouterError::Resolve(ResolveError::NotInstalled { .. })
        | RouterError::Resolve(ResolveError::Unresolvable { .. }) => 127,
        RouterError::NotExecutable { .. } => 126,
        _ => 1,
    }
}

fn main() {
    init_logging();

    let mut args = std::env::args().skip(1);
    let Some(verb) = args.next() else {
        eprintln!("{USAGE}");
        exit(2);
    };

    let proxy = match default_proxy() {
        Ok(proxy) => proxy,
        Err(err) => {
            eprintln!("verlay: {err:#}");
            exit(1);
        }
    };

    match verb.as_str() {
        "rehash" => match proxy.rehash() {
            Ok(report) => {
                eprintln!(
                    "verlay: linked {} version(s), swept {} broken link(s)",
                    report.linked, report.cleaned
                );
                for (what, err) in &report.failures {
                    eprintln!("verlay: {what}: {err:#}");
                }
                let status = proxy.path_status();
                if !status.on_path {
                    eprintln!(
                        "verlay: note: '{}' is not on PATH{}",
                        status.shim_dir.display(),
                        status
                            .shell
                            .map(|s| format!(" for your {s} session"))
                            .unwrap_or_default()
                    );
                }
                exit(if report.failures.is_empty() { 0 } else { 1 });
            }
            Err(err) => {
                eprintln!("verlay: rehash failed: {err:#}");
                exit(1);
            }
        },
        "prune" => match proxy.teardown() {
            Ok(status) => {
                eprintln!("verlay: removed shims under '{}'", status.shim_dir.display());
                if status.on_path {
                    eprintln!(
                        "verlay: note: '{}' is still on PATH",
                        status.shim_dir.display()
                    );
                }
            }
            Err(err) => {
                eprintln!("verlay: prune failed: {err:#}");
                exit(1);
            }
        },
        tool => {
            let forwarded: Vec<String> = args.collect();
            match proxy.intercept(tool, &forwarded) {
                Ok(code) => exit(code),
                Err(err) => {
                    eprintln!("verlay: {err}");
                    exit(exit_code_for(&err));
                }
            }
        }
    }
}
