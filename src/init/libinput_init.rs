use std::fs::{File, OpenOptions};
use std::io::{Error, ErrorKind};
use std::os::unix::{fs::OpenOptionsExt, io::OwnedFd};
use std::path::Path;

use input::{event::EventTrait, DeviceCapability::Touch, Libinput, LibinputInterface};
use nix::libc::{O_RDONLY, O_RDWR, O_WRONLY};
use tracing::{error, info};
use users::{get_current_uid, get_user_by_uid, get_user_groups};

// straight from the docs for input.rs, if I'm honest
pub struct Interface;

impl LibinputInterface for Interface {
    fn open_restricted(&mut self, path: &Path, flags: i32) -> Result<OwnedFd, i32> {
        OpenOptions::new()
            .custom_flags(flags)
            .read((flags & O_RDONLY != 0) | (flags & O_RDWR != 0))
            .write((flags & O_WRONLY != 0) | (flags & O_RDWR != 0))
            .open(path)
            .map(|file| file.into())
            .map_err(|err| err.raw_os_error().unwrap())
    }
    fn close_restricted(&mut self, fd: OwnedFd) {
        drop(File::from(fd));
    }
}

fn bind_touchscreen(udev_name: String) -> Result<Libinput, Error> {
    let mut touchscreen = Libinput::new_from_path(Interface);

    match touchscreen.path_add_device(&format!("/dev/input/{udev_name}")) {
        Some(dev) => {
            info!(
                "Touch device \"{}\" (udev path: /dev/input/{}) found and loaded.",
                dev.name(),
                dev.sysname()
            );
            Ok(touchscreen)
        }
        None => {
            error!(
                "Could not load the touch device at `/dev/input/{udev_name}`. \
                The underlying crate (input.rs) does not raise errors when a \
                device cannot be loaded, so this may also be a permissions \
                problem with /dev/input."
            );
            Err(Error::new(
                ErrorKind::AddrNotAvailable,
                "touchscreen found, could not bind",
            ))
        }
    }
}

// udev_assign_seat() and path_add_device() stay silent on failure, so
// when no device turns up we have to work out which of the two likely
// causes applies:
//
//    1. Insufficient permissions on /dev/input -- zero devices were
//       enumerated at all, or the user is not in the 'input' group.
//
//    2. No touch-capable device exists on this seat.
fn raise_correct_error(devices_added: i8) -> Result<Libinput, Error> {
    let you = get_user_by_uid(get_current_uid())
        .expect("the user that started this program has vanished from the user database");

    let your_groups = get_user_groups(you.name(), you.primary_group_id())
        .expect("the current user belongs to no groups at all");

    let in_input_group = your_groups.iter().any(|group| group.name() == "input");

    if devices_added == 0 || !in_input_group {
        error!(
            "This program does not have permission to read /dev/input, most \
            likely because you are not in the user group 'input'. Add yourself \
            to the group, then log out and back in (or reboot) so the change \
            takes effect."
        );

        return Err(Error::new(
            ErrorKind::PermissionDenied,
            "not in user group 'input'",
        ));
    }

    error!(
        "No touch-capable input device was found on this seat \
        (devices enumerated: {devices_added}). A touchscreen is required."
    );

    Err(Error::new(ErrorKind::NotFound, "touchscreen not found"))
}

/// Scans the udev seat for the first device with touch capability and
/// binds it on a dedicated libinput context.
pub fn find_touchscreen() -> Result<Libinput, Error> {
    let mut all_inputs: Libinput = Libinput::new_with_udev(Interface);
    all_inputs.udev_assign_seat("seat0").unwrap(); // will not throw an error on failure!

    // Added-device events are consumed by find(), so count them as we go.
    let mut dev_added_count: i8 = 0;

    let touch_find_opt = all_inputs.find(|event| {
        dev_added_count += 1;
        event.device().has_capability(Touch)
    });

    let udev_name = match touch_find_opt {
        Some(added_ev) => added_ev.device().sysname().to_string(),
        None => return raise_correct_error(dev_added_count),
    };

    bind_touchscreen(udev_name)
}
