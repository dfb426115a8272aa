use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;

use twamp_light::configuration::Configuration;
use twamp_light::error::TwampError;
use twamp_light::listener::Listener;
use twamp_light::metrics::{MetricsSink, RecorderSink};
use twamp_light::sender::Sender;
use twamp_light::stats::ProbeSummary;

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = Configuration::parse();
    if let Err(e) = args.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(2);
    }

    let result = if args.reflector {
        run_reflector(&args).await
    } else {
        // validate() guarantees the remote address is present here.
        match args.remote_addr {
            Some(remote) => run_sender(&args, remote).await,
            None => unreachable!("validated configuration"),
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn metrics_sink(args: &Configuration) -> Option<Arc<dyn MetricsSink>> {
    args.metrics
        .then(|| Arc::new(RecorderSink) as Arc<dyn MetricsSink>)
}

async fn run_reflector(args: &Configuration) -> Result<(), TwampError> {
    let listener = Listener::bind(
        (args.local_addr, args.local_port),
        args.bufsize,
        metrics_sink(args),
    )
    .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupt received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    listener.run(shutdown_rx).await
}

async fn run_sender(args: &Configuration, remote: IpAddr) -> Result<(), TwampError> {
    let sender = Sender::new(
        (args.local_addr, args.local_port),
        (remote, args.remote_port),
        Duration::from_secs(args.timeout as u64),
        metrics_sink(args),
    )
    .await?;

    for i in 0..args.count {
        match sender.send_probe_with_padding(args.padding).await {
            Ok(res) => log::info!(
                "seq={} rtt={:.3}ms",
                res.seq,
                res.rtt.as_secs_f64() * 1000.0
            ),
            Err(e) => log::warn!("Probe failed: {}", e),
        }
        if i + 1 < args.count {
            tokio::time::sleep(Duration::from_millis(args.interval)).await;
        }
    }

    print_summary(&sender.summary(), args.json);
    Ok(())
}

fn print_summary(summary: &ProbeSummary, json: bool) {
    if json {
        if let Ok(out) = serde_json::to_string(summary) {
            println!("{}", out);
        }
        return;
    }

    let attempts = summary.count + summary.lost;
    let loss_percent = if attempts > 0 {
        summary.lost as f64 / attempts as f64 * 100.0
    } else {
        0.0
    };
    let ms = |d: Duration| d.as_secs_f64() * 1000.0;

    println!("\n--- TWAMP-Light Statistics ---");
    println!("Probes sent: {}", attempts);
    println!("Replies received: {}", summary.count);
    println!("Lost: {} ({:.1}%)", summary.lost, loss_percent);
    if summary.count > 0 {
        println!("Min RTT: {:.3} ms", ms(summary.min_rtt));
        println!("Max RTT: {:.3} ms", ms(summary.max_rtt));
        println!("Avg RTT: {:.3} ms", ms(summary.avg_rtt()));
        println!("Jitter: {:.3} ms", ms(summary.jitter));
    }
}
