//! Output encodings: LVGL `.bin`, C source array, PNG preview.

use crate::error::Img2LvglError;
use crate::format::Compression;
use crate::pipeline::compress;
use crate::pipeline::pack::{ImageHeader, PackedImage, FLAG_COMPRESSED};
use image::RgbaImage;
use std::fmt::Write as _;
use std::io::Cursor;

/// Bytes per row of the C table.
const C_BYTES_PER_LINE: usize = 16;

/// Compress the packed data if requested, setting the header flag.
fn finalize(packed: &PackedImage, compression: Compression) -> (ImageHeader, Vec<u8>) {
    let mut header = packed.header;
    if header.format.is_raw() {
        return (header, packed.data.clone());
    }

    let block = (header.format.bpp() as usize).div_ceil(8);
    match compress::compress(&packed.data, compression, block) {
        Some(data) => {
            header.flags |= FLAG_COMPRESSED;
            (header, data)
        }
        None => (header, packed.data.clone()),
    }
}

/// LVGL binary file: header followed by the (possibly compressed) data.
pub fn to_bin(packed: &PackedImage, compression: Compression) -> Vec<u8> {
    let (header, data) = finalize(packed, compression);
    let mut out = Vec::with_capacity(header.to_bytes().len() + data.len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&data);
    out
}

/// C source defining `<name>_map[]` and the `lv_image_dsc_t <name>`.
pub fn to_c_array(packed: &PackedImage, compression: Compression, name: &str) -> String {
    let (header, data) = finalize(packed, compression);
    let attr = format!("LV_ATTRIBUTE_{}", name.to_ascii_uppercase());

    let mut out = String::with_capacity(data.len() * 6 + 1024);
    out.push_str(
        "#if defined(LV_LVGL_H_INCLUDE_SIMPLE)\n\
         #include \"lvgl.h\"\n\
         #elif defined(LV_BUILD_TEST)\n\
         #include \"../lvgl.h\"\n\
         #else\n\
         #include \"lvgl/lvgl.h\"\n\
         #endif\n\n",
    );
    out.push_str("#ifndef LV_ATTRIBUTE_MEM_ALIGN\n#define LV_ATTRIBUTE_MEM_ALIGN\n#endif\n\n");
    let _ = write!(out, "#ifndef {attr}\n#define {attr}\n#endif\n\n");
    let _ = writeln!(
        out,
        "static const\nLV_ATTRIBUTE_MEM_ALIGN LV_ATTRIBUTE_LARGE_CONST {attr}\nuint8_t {name}_map[] = {{"
    );

    for line in data.chunks(C_BYTES_PER_LINE) {
        out.push_str("   ");
        for b in line {
            let _ = write!(out, " 0x{b:02x},");
        }
        out.push('\n');
    }
    out.push_str("};\n\n");

    let flags = if header.is_compressed() {
        "0 | LV_IMAGE_FLAGS_COMPRESSED"
    } else {
        "0"
    };
    let _ = write!(
        out,
        "const lv_image_dsc_t {name} = {{\n  \
         .header.magic = LV_IMAGE_HEADER_MAGIC,\n  \
         .header.cf = LV_COLOR_FORMAT_{cf},\n  \
         .header.flags = {flags},\n  \
         .header.w = {w},\n  \
         .header.h = {h},\n  \
         .header.stride = {stride},\n  \
         .data_size = sizeof({name}_map),\n  \
         .data = {name}_map,\n\
         }};\n",
        cf = header.format.name(),
        w = header.width,
        h = header.height,
        stride = header.stride,
    );
    out
}

/// PNG encoding of the display-equivalent pixels.
pub fn to_png(pixels: &RgbaImage) -> Result<Vec<u8>, Img2LvglError> {
    let mut buf = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(Img2LvglError::Encode)?;
    Ok(buf)
}
