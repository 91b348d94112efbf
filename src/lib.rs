pub mod init {
    pub mod config;
    pub mod libinput_init;
}

pub mod runtime {
    pub mod command;
    pub mod contacts;
    pub mod emitter;
    pub mod event_handler;
    pub mod keys;
    pub mod scrollbar;
    pub mod throttle;
    pub mod touchpad;
}
