//! Network interface lookup.
//!
//! Resolves an interface name to its index, hardware address and the IPv4 and
//! IPv6 addresses bound to it.

use crate::error::ProbeError;
use bytes::Bytes;
use std::{
    ffi::{CStr, CString},
    io,
    net::{Ipv4Addr, Ipv6Addr},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub index: u32,
    /// Empty when the link has no hardware address (e.g. tun devices).
    pub hardware_address: Bytes,
    pub ipv4: Vec<Ipv4Addr>,
    pub ipv6: Vec<Ipv6Addr>,
}

pub trait InterfaceLookup {
    fn lookup(&self, name: &str) -> Result<InterfaceInfo, ProbeError>;
}

/// Reads interfaces from the running system with `getifaddrs(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceLookup for SystemInterfaces {
    fn lookup(&self, name: &str) -> Result<InterfaceInfo, ProbeError> {
        let c_name =
            CString::new(name).map_err(|_| ProbeError::InterfaceNotFound(name.to_string()))?;
        // SAFETY: `c_name` is a valid NUL-terminated string.
        let index = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
        if index == 0 {
            return Err(ProbeError::InterfaceNotFound(name.to_string()));
        }

        let mut info = InterfaceInfo {
            name: name.to_string(),
            index,
            hardware_address: Bytes::new(),
            ipv4: Vec::new(),
            ipv6: Vec::new(),
        };

        // SAFETY: getifaddrs/freeifaddrs are standard POSIX functions.
        // The list is only read between the two calls.
        unsafe {
            let mut addrs: *mut libc::ifaddrs = std::ptr::null_mut();
            if libc::getifaddrs(&mut addrs) != 0 {
                return Err(ProbeError::InterfaceLookup(io::Error::last_os_error()));
            }

            let mut cursor = addrs;
            while !cursor.is_null() {
                let ifa = &*cursor;
                cursor = ifa.ifa_next;

                if ifa.ifa_addr.is_null() || CStr::from_ptr(ifa.ifa_name).to_bytes() != name.as_bytes()
                {
                    continue;
                }
                collect_address(&mut info, ifa.ifa_addr);
            }

            libc::freeifaddrs(addrs);
        }

        tracing::trace!(?info, "Resolved interface");
        Ok(info)
    }
}

/// # Safety
///
/// `addr` must point to a valid socket address as returned by `getifaddrs`.
unsafe fn collect_address(info: &mut InterfaceInfo, addr: *const libc::sockaddr) {
    match (*addr).sa_family as libc::c_int {
        libc::AF_INET => {
            let sin = &*(addr as *const libc::sockaddr_in);
            info.ipv4
                .push(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)));
        }
        libc::AF_INET6 => {
            let sin6 = &*(addr as *const libc::sockaddr_in6);
            info.ipv6.push(Ipv6Addr::from(sin6.sin6_addr.s6_addr));
        }
        #[cfg(any(target_os = "linux", target_os = "android"))]
        libc::AF_PACKET => {
            let sll = &*(addr as *const libc::sockaddr_ll);
            let len = (sll.sll_halen as usize).min(sll.sll_addr.len());
            if len > 0 {
                info.hardware_address = Bytes::copy_from_slice(&sll.sll_addr[..len]);
            }
        }
        #[cfg(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        ))]
        libc::AF_LINK => {
            let sdl = &*(addr as *const libc::sockaddr_dl);
            let len = sdl.sdl_alen as usize;
            if len > 0 {
                let base = sdl.sdl_data.as_ptr() as *const u8;
                let mac = std::slice::from_raw_parts(base.add(sdl.sdl_nlen as usize), len);
                info.hardware_address = Bytes::copy_from_slice(mac);
            }
        }
        _ => {}
    }
}
