use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use keylink_frame::{FrameConfig, PartialFramePolicy, Payload};
use keylink_session::LinkSession;
use keylink_transport::Transport;
use tracing::info;

use crate::cmd::{open_link, parse_duration, ListenArgs};
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_payload, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let poll = parse_duration(&args.poll)?;
    let frame = FrameConfig {
        policy: if args.buffer_partial {
            PartialFramePolicy::Buffer
        } else {
            PartialFramePolicy::Block
        },
        ..FrameConfig::default()
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut link = open_link(&args.link, frame)?;
    let filter = KeyFilter::new(args.keys.as_deref());
    let port = args.link.port.as_str();

    let printed = pump(&mut link, &running, &filter, args.count, poll, |payload| {
        print_payload("received", port, payload, format);
    })?;
    info!(printed, "listen finished");

    link.close()
        .map_err(|err| session_error("close failed", err))?;
    Ok(SUCCESS)
}

/// Keys the user asked to see. Empty means all of them.
struct KeyFilter<'a> {
    keys: &'a [u16],
}

impl<'a> KeyFilter<'a> {
    fn new(keys: Option<&'a [u16]>) -> Self {
        Self {
            keys: keys.unwrap_or_default(),
        }
    }

    fn accepts(&self, payload: &Payload) -> bool {
        self.keys.is_empty() || self.keys.contains(&payload.key().get())
    }
}

/// Poll `link` until `running` clears or `count` matching payloads were emitted.
fn pump<T, F>(
    link: &mut LinkSession<T>,
    running: &AtomicBool,
    filter: &KeyFilter<'_>,
    count: Option<usize>,
    idle: std::time::Duration,
    mut emit: F,
) -> CliResult<usize>
where
    T: Transport,
    F: FnMut(&Payload),
{
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        if count.is_some_and(|limit| printed >= limit) {
            break;
        }

        let payload = match link.receive() {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                std::thread::sleep(idle);
                continue;
            }
            Err(err) => return Err(session_error("receive failed", err)),
        };

        if !filter.accepts(&payload) {
            continue;
        }

        emit(&payload);
        printed = printed.saturating_add(1);
    }

    Ok(printed)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
