// src/surface/fbdev.rs

//! Linux framebuffer device (`/dev/fbN`) backing.
//!
//! The device is opened read/write, its geometry is queried with the
//! `FBIOGET_VSCREENINFO` / `FBIOGET_FSCREENINFO` ioctls and its memory is
//! mapped shared. Only byte-aligned 24 and 32 bits-per-pixel formats are
//! supported; the channel offsets reported by the driver are honoured.

use super::{PixelLayout, PixelMemory};
use anyhow::{bail, Context, Result};
use log::{debug, warn};
use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use std::ffi::c_void;
use std::fs::{File, OpenOptions};
use std::num::NonZeroUsize;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::ptr::NonNull;

/// `struct fb_bitfield` from `<linux/fb.h>`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct FbBitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

/// `struct fb_var_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct FbVarScreeninfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo` from `<linux/fb.h>`.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct FbFixScreeninfo {
    pub id: [libc::c_char; 16],
    pub smem_start: libc::c_ulong,
    pub smem_len: u32,
    pub type_: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub line_length: u32,
    pub mmio_start: libc::c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

nix::ioctl_read_bad!(fbioget_vscreeninfo, 0x4600, FbVarScreeninfo);
nix::ioctl_read_bad!(fbioget_fscreeninfo, 0x4602, FbFixScreeninfo);

/// Shared mapping of the device memory, unmapped on drop.
struct DeviceMap {
    ptr: NonNull<c_void>,
    len: usize,
}

impl Drop for DeviceMap {
    fn drop(&mut self) {
        // SAFETY: ptr/len are exactly what mmap returned and nothing else
        // unmaps this region.
        if let Err(e) = unsafe { munmap(self.ptr, self.len) } {
            warn!("FbDevice: munmap failed: {}", e);
        }
    }
}

/// An opened and mapped framebuffer device.
pub struct FbDevice {
    map: DeviceMap,
    // Keeps the descriptor open for the lifetime of the mapping.
    _file: File,
    width: u32,
    height: u32,
    layout: PixelLayout,
}

impl FbDevice {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .context("open failed")?;
        let fd = file.as_raw_fd();

        let mut var = FbVarScreeninfo::default();
        let mut fix = FbFixScreeninfo::default();
        // SAFETY: both structs are repr(C) mirrors of the kernel structures
        // the ioctls fill in.
        unsafe {
            fbioget_vscreeninfo(fd, &mut var).context("FBIOGET_VSCREENINFO failed")?;
            fbioget_fscreeninfo(fd, &mut fix).context("FBIOGET_FSCREENINFO failed")?;
        }
        debug!(
            "FbDevice {}: {}x{} (virtual {}x{}), {} bpp, line_length {}, smem_len {}",
            path.display(),
            var.xres,
            var.yres,
            var.xres_virtual,
            var.yres_virtual,
            var.bits_per_pixel,
            fix.line_length,
            fix.smem_len
        );

        let layout = layout_for(&var, &fix)?;
        if (fix.smem_len as usize) < visible_end(&layout, &var) {
            bail!(
                "device memory too small: {} bytes for {}x{} at stride {}",
                fix.smem_len,
                var.xres,
                var.yres,
                layout.stride
            );
        }

        let len = NonZeroUsize::new(fix.smem_len as usize)
            .context("device reports no framebuffer memory")?;
        // SAFETY: mapping a device file we hold open; the region is only
        // accessed through DeviceMap within `len` bytes.
        let ptr = unsafe {
            mmap(
                None,
                len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &file,
                0,
            )
        }
        .context("mmap failed")?;

        Ok(Self {
            map: DeviceMap {
                ptr,
                len: len.get(),
            },
            _file: file,
            width: var.xres,
            height: var.yres,
            // Draw into the currently displayed page of the virtual screen.
            layout: page_layout(layout, &var),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }
}

/// Derives the byte layout from the kernel-reported screen info.
pub fn layout_for(var: &FbVarScreeninfo, fix: &FbFixScreeninfo) -> Result<PixelLayout> {
    let bytes_per_pixel = match var.bits_per_pixel {
        24 => 3,
        32 => 4,
        other => bail!("unsupported pixel depth: {} bits per pixel", other),
    };
    for (name, field) in [("red", var.red), ("green", var.green), ("blue", var.blue)] {
        if field.length != 8
            || field.offset % 8 != 0
            || field.msb_right != 0
            || (field.offset / 8) as usize >= bytes_per_pixel
        {
            bail!(
                "unsupported {} channel: offset {}, length {}",
                name,
                field.offset,
                field.length
            );
        }
    }
    let stride = if fix.line_length != 0 {
        fix.line_length as usize
    } else {
        var.xres_virtual as usize * bytes_per_pixel
    };
    if stride < var.xres as usize * bytes_per_pixel {
        bail!(
            "line length {} is shorter than {} pixels of {} bytes",
            stride,
            var.xres,
            bytes_per_pixel
        );
    }

    Ok(PixelLayout {
        bytes_per_pixel,
        stride,
        red_offset: (var.red.offset / 8) as usize,
        green_offset: (var.green.offset / 8) as usize,
        blue_offset: (var.blue.offset / 8) as usize,
    })
}

/// One past the last byte of the visible page.
fn visible_end(layout: &PixelLayout, var: &FbVarScreeninfo) -> usize {
    if var.xres == 0 || var.yres == 0 {
        return 0;
    }
    layout.offset(var.xoffset, var.yoffset + var.yres - 1)
        + var.xres as usize * layout.bytes_per_pixel
}

/// Shifts channel offsets so that `(0, 0)` addresses the visible page.
fn page_layout(layout: PixelLayout, var: &FbVarScreeninfo) -> PixelLayout {
    let origin = layout.offset(var.xoffset, var.yoffset);
    PixelLayout {
        red_offset: layout.red_offset + origin,
        green_offset: layout.green_offset + origin,
        blue_offset: layout.blue_offset + origin,
        ..layout
    }
}

impl PixelMemory for FbDevice {
    fn bytes(&self) -> &[u8] {
        // SAFETY: the mapping is valid for `len` bytes while `self` lives.
        unsafe { std::slice::from_raw_parts(self.map.ptr.as_ptr() as *const u8, self.map.len) }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above; `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.map.ptr.as_ptr() as *mut u8, self.map.len) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitfield(offset: u32) -> FbBitfield {
        FbBitfield {
            offset,
            length: 8,
            msb_right: 0,
        }
    }

    fn screen(bpp: u32) -> FbVarScreeninfo {
        FbVarScreeninfo {
            xres: 640,
            yres: 480,
            xres_virtual: 640,
            yres_virtual: 960,
            bits_per_pixel: bpp,
            red: bitfield(16),
            green: bitfield(8),
            blue: bitfield(0),
            ..FbVarScreeninfo::default()
        }
    }

    #[test]
    fn bgrx_32bpp_layout() {
        let fix = FbFixScreeninfo {
            line_length: 2560,
            ..FbFixScreeninfo::default()
        };
        let layout = layout_for(&screen(32), &fix).unwrap();
        assert_eq!(layout.bytes_per_pixel, 4);
        assert_eq!(layout.stride, 2560);
        assert_eq!(
            (layout.red_offset, layout.green_offset, layout.blue_offset),
            (2, 1, 0)
        );
    }

    #[test]
    fn stride_falls_back_to_virtual_width() {
        let layout = layout_for(&screen(24), &FbFixScreeninfo::default()).unwrap();
        assert_eq!(layout.stride, 640 * 3);
    }

    #[test]
    fn rgb565_is_rejected() {
        let mut var = screen(16);
        var.red = FbBitfield {
            offset: 11,
            length: 5,
            msb_right: 0,
        };
        assert!(layout_for(&var, &FbFixScreeninfo::default()).is_err());
    }

    #[test]
    fn channel_outside_the_pixel_is_rejected() {
        let mut var = screen(24);
        var.red = bitfield(24);
        assert!(layout_for(&var, &FbFixScreeninfo::default()).is_err());

        let mut var = screen(32);
        var.blue = bitfield(32);
        assert!(layout_for(&var, &FbFixScreeninfo::default()).is_err());
    }

    #[test]
    fn short_line_length_is_rejected() {
        let fix = FbFixScreeninfo {
            line_length: 640 * 3 - 1,
            ..FbFixScreeninfo::default()
        };
        assert!(layout_for(&screen(24), &fix).is_err());
    }

    #[test]
    fn panned_screen_offsets_into_the_visible_page() {
        let mut var = screen(32);
        var.yoffset = 480;
        let base = layout_for(&var, &FbFixScreeninfo::default()).unwrap();
        let paged = page_layout(base, &var);
        assert_eq!(paged.offset(0, 0) + paged.red_offset, 480 * 2560 + 2);
        assert_eq!(visible_end(&base, &var), 960 * 2560);
    }

    #[test]
    fn horizontal_pan_extends_the_visible_end() {
        let mut var = screen(24);
        var.xres_virtual = 700;
        var.xoffset = 60;
        let layout = layout_for(&var, &FbFixScreeninfo::default()).unwrap();
        assert_eq!(layout.stride, 700 * 3);
        assert_eq!(visible_end(&layout, &var), 479 * 700 * 3 + 60 * 3 + 640 * 3);
    }
}
