use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use signal_hook::{
    consts::{SIGINT, SIGTERM},
    flag,
};
use tokio::sync::mpsc::{self, Receiver};
use tracing::{error, info};

use touch_relay::{
    init::{config, libinput_init},
    runtime::{
        emitter::{Transport, WsTransport},
        event_handler::{ControlSignal, TouchTranslator, TrError},
    },
};

#[tokio::main]
async fn main() -> Result<(), TrError> {
    let configs = config::init_cfg();
    config::init_logger(&configs);
    info!("Logger initialized!");

    // handling SIGINT and SIGTERM
    let should_exit = Arc::new(AtomicBool::new(false));
    flag::register(SIGTERM, Arc::clone(&should_exit)).unwrap();
    flag::register(SIGINT, Arc::clone(&should_exit)).unwrap();

    let (sender, recvr) = mpsc::channel::<ControlSignal>(8);

    info!("Connecting to remote endpoint at {}...", configs.ws_url());
    let transport = WsTransport::connect(&configs.ws_url())?;

    info!("Searching for a touchscreen on your device...");
    let touchscreen = libinput_init::find_touchscreen()?;

    let translator = TouchTranslator::new(configs, transport, sender);
    run_main_event_loop(translator, recvr, &should_exit, touchscreen).await
}

// This function is placed in `main.rs` since it's essentially a
// part of `main`, broken out so `main` isn't too sprawling.
async fn run_main_event_loop<T: Transport>(
    mut translator: TouchTranslator<T>,
    mut recvr: Receiver<ControlSignal>,
    should_exit: &Arc<AtomicBool>,
    mut touchscreen: input::Libinput,
) -> Result<(), TrError> {
    info!("touch-relay started successfully!");

    loop {
        // this is to keep the infinite loop from filling out an
        // entire CPU core, which it will do even on no-ops.
        std::thread::sleep(translator.cfg.response_time);

        if should_exit.load(Ordering::Relaxed) {
            break;
        }

        // long-press timers report in here
        while let Ok(sig) = recvr.try_recv() {
            if let Err(e) = translator.handle_signal(sig) {
                error!("{:?}", e);
            }
        }

        if let Err(e) = touchscreen.dispatch() {
            error!("A {} error occured in reading device buffer: {}", e.kind(), e);
        }

        for event in &mut touchscreen {
            // do nothing on success; a failed emit is logged and the
            // interaction surface keeps running
            if let Err(e) = translator.translate(event) {
                error!("{:?}", e);
            }
        }
    }

    info!("Cleaning up and exiting...");
    Ok(())
}
