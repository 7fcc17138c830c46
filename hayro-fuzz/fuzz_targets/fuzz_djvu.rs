#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = hayro_djvu::decode_bzz(data);
    let _ = hayro_djvu::decode_jb2(data, None);

    // Use the first half as a shared dictionary for the second.
    let (shared, page) = data.split_at(data.len() / 2);
    if let Ok(dictionary) = hayro_djvu::decode_jb2_dictionary(shared) {
        let _ = hayro_djvu::decode_jb2(page, Some(&dictionary));
    }
});
