/// Maps evdev key codes to the browser-style key names the remote
/// endpoint understands ("a", "Enter", "ArrowLeft", ...). The remote
/// resolves single characters through its char-to-VK path and the named
/// keys through a lookup table, so both forms go out verbatim.
///
/// Keys with no sensible remote meaning (function keys, media keys)
/// yield `None` and are not forwarded.
pub fn key_name(code: u32) -> Option<&'static str> {
    let name = match code {
        1 => "Escape",
        2 => "1",
        3 => "2",
        4 => "3",
        5 => "4",
        6 => "5",
        7 => "6",
        8 => "7",
        9 => "8",
        10 => "9",
        11 => "0",
        12 => "-",
        13 => "=",
        14 => "Backspace",
        15 => "Tab",
        16 => "q",
        17 => "w",
        18 => "e",
        19 => "r",
        20 => "t",
        21 => "y",
        22 => "u",
        23 => "i",
        24 => "o",
        25 => "p",
        26 => "[",
        27 => "]",
        28 => "Enter",
        29 => "Control",
        30 => "a",
        31 => "s",
        32 => "d",
        33 => "f",
        34 => "g",
        35 => "h",
        36 => "j",
        37 => "k",
        38 => "l",
        39 => ";",
        40 => "'",
        41 => "`",
        42 => "Shift",
        43 => "\\",
        44 => "z",
        45 => "x",
        46 => "c",
        47 => "v",
        48 => "b",
        49 => "n",
        50 => "m",
        51 => ",",
        52 => ".",
        53 => "/",
        54 => "Shift",     // right shift
        56 => "Alt",
        57 => " ",
        97 => "Control",   // right ctrl
        100 => "Alt",      // right alt
        103 => "ArrowUp",
        105 => "ArrowLeft",
        106 => "ArrowRight",
        108 => "ArrowDown",
        111 => "Delete",
        _ => return None,
    };
    Some(name)
}
