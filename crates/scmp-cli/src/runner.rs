//! Echo runner that wires resolver, session, transport and driver together.

use crate::resolver::StaticResolver;
use crate::transport::UdpTransport;
use crate::EchoArgs;
use scmp_core::execution::run;
use scmp_core::{
    ConfigError, PathEntry, PathResolver, ProbeDriver, ProbeEvent, RunParams, ScmpError, Session,
    ShutdownCoordinator, Summary, ValidatedConfig, ENDHOST_PORT,
};
use scmp_echo::EchoDriver;
use std::io::{BufRead, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Get the local IP address used to reach `target`.
fn get_local_addr(target: IpAddr) -> Result<IpAddr, ScmpError> {
    let bind = match target {
        IpAddr::V4(_) => SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0),
        IpAddr::V6(_) => SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 0),
    };
    let socket =
        std::net::UdpSocket::bind(bind).map_err(|source| ScmpError::SocketBind { addr: bind, source })?;
    // Connecting a UDP socket sends nothing but selects the outgoing address.
    socket.connect(SocketAddr::new(target, ENDHOST_PORT))?;
    Ok(socket.local_addr()?.ip())
}

/// Lets the user pick one of `paths`. Re-prompts until the answer is a
/// valid index.
pub fn choose_path<R: BufRead, W: Write>(
    paths: &[PathEntry],
    mut input: R,
    mut output: W,
) -> Result<PathEntry, ScmpError> {
    let io_err = |e: std::io::Error| ScmpError::PathResolution(e.to_string());

    writeln!(output, "Available paths:").map_err(io_err)?;
    for (i, path) in paths.iter().enumerate() {
        writeln!(output, "[{:2}] {}", i, path).map_err(io_err)?;
    }
    loop {
        write!(output, "Choose path: ").map_err(io_err)?;
        output.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            return Err(ScmpError::PathResolution("no path selected".to_string()));
        }
        match line.trim().parse::<usize>() {
            Ok(i) if i < paths.len() => return Ok(paths[i].clone()),
            _ => writeln!(output, "Invalid path index {:?}", line.trim()).map_err(io_err)?,
        }
    }
}

async fn select_path(
    resolver: &dyn PathResolver,
    config: &ValidatedConfig,
) -> Result<PathEntry, ScmpError> {
    let mut paths = resolver.paths(config.local_ia, config.remote.ia).await?;
    debug!(count = paths.len(), "Resolved paths");
    if paths.is_empty() {
        return Err(ConfigError::NoPath(config.remote.ia).into());
    }
    if config.interactive && paths.len() > 1 {
        let stdin = std::io::stdin();
        return choose_path(&paths, stdin.lock(), std::io::stdout());
    }
    Ok(paths.swap_remove(0))
}

/// Runs an echo session and returns its summary.
pub async fn run_echo(args: &EchoArgs, config: ValidatedConfig) -> Result<Summary, ScmpError> {
    let resolver = StaticResolver::from_hex(&args.paths, config.remote.next_hop, args.mtu)?;
    let path = select_path(&resolver, &config).await?;

    let local_ip = match config.local_ip {
        Some(ip) => ip,
        None => {
            let target = path
                .next_hop
                .or(config.remote.next_hop)
                .map_or(config.remote.host.ip(), |nh| nh.ip());
            get_local_addr(target)?
        }
    };

    let session = Arc::new(Session::new(&config, local_ip, path)?);
    let transport = UdpTransport::bind(SocketAddr::new(local_ip, 0)).await?;
    info!(
        local = %format!("{},[{}]", session.local().ia, session.local().ip),
        bound = %transport.local_addr()?,
        remote = %session.remote(),
        next_hop = %session.derive_next_hop(),
        mtu = session.mtu(),
        "Using path"
    );

    let mut driver = EchoDriver::new(Arc::clone(&session), transport);

    let stats_session = Arc::clone(&session);
    let mut shutdown = ShutdownCoordinator::install(move || {
        let stats = stats_session.stats();
        info!(
            sent = stats.sent,
            received = stats.recv,
            loss = stats.loss_percentage(),
            "Echo interrupted"
        );
    });

    let json = args.json;
    let params = RunParams::from_config(&config);
    let result = run(&mut driver, &params, &mut shutdown, |event| {
        if json {
            return;
        }
        match event {
            ProbeEvent::Reply(reply) => println!("{}", reply),
            ProbeEvent::Revocation(notice) => println!("{}", notice),
        }
    })
    .await;

    if let Err(e) = driver.close().await {
        warn!(error = %e, "Failed to close driver");
    }
    let report = result?;
    Ok(Summary::new(&session, &report))
}
