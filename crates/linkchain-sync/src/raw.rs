//! Raw Ethernet transport.
//!
//! Frames are broadcast to `ff:ff:ff:ff:ff:ff` under a dedicated EtherType and
//! captured from the same interface. Linux only (`AF_PACKET`); opening needs
//! `CAP_NET_RAW`.

/// IEEE 802 local experimental EtherType carried by gossip frames.
pub const ETHER_TYPE: u16 = 0x88B5;

#[cfg(target_os = "linux")]
pub use linux::RawSocketTransport;

#[cfg(not(target_os = "linux"))]
pub use unsupported::RawSocketTransport;

#[cfg(target_os = "linux")]
mod linux {
    use std::ffi::CString;
    use std::io;
    use std::mem;
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
    use std::time::Duration;

    use bytes::{BufMut, BytesMut};
    use tracing::{debug, trace};

    use linkchain_protocol::MAX_FRAME_SIZE;

    use super::ETHER_TYPE;
    use crate::error::{SyncError, SyncResult};
    use crate::transport::FrameTransport;

    const ETH_HEADER_LEN: usize = 14;
    const ETH_ALEN: usize = 6;
    const BROADCAST_MAC: [u8; ETH_ALEN] = [0xff; ETH_ALEN];
    /// `sll_pkttype` of frames this host sent.
    const PACKET_OUTGOING: u8 = 4;
    const RECV_BUFFER: usize = 2048;

    /// `AF_PACKET` socket bound to one interface and [`ETHER_TYPE`].
    pub struct RawSocketTransport {
        device: String,
        fd: OwnedFd,
        ifindex: libc::c_int,
        mac: [u8; ETH_ALEN],
    }

    impl RawSocketTransport {
        pub fn open(device: &str) -> SyncResult<Self> {
            let unavailable = |reason: String| SyncError::TransportUnavailable {
                device: device.to_string(),
                reason,
            };

            let name = CString::new(device)
                .map_err(|_| unavailable("device name contains a NUL byte".into()))?;

            // SAFETY: `name` is a valid NUL-terminated string.
            let ifindex = unsafe { libc::if_nametoindex(name.as_ptr()) };
            if ifindex == 0 {
                return Err(unavailable(io::Error::last_os_error().to_string()));
            }
            let ifindex = ifindex as libc::c_int;

            // SAFETY: plain syscall; the result is checked before use.
            let raw = unsafe {
                libc::socket(
                    libc::AF_PACKET,
                    libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                    libc::c_int::from(ETHER_TYPE.to_be()),
                )
            };
            if raw < 0 {
                return Err(unavailable(io::Error::last_os_error().to_string()));
            }
            // SAFETY: `raw` is a freshly opened descriptor owned by nobody else.
            let fd = unsafe { OwnedFd::from_raw_fd(raw) };

            let addr = link_addr(ifindex, None);
            // SAFETY: `addr` is a fully initialised `sockaddr_ll` and the
            // length passed matches its size.
            let rc = unsafe {
                libc::bind(
                    fd.as_raw_fd(),
                    &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
                    mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
                )
            };
            if rc < 0 {
                return Err(unavailable(io::Error::last_os_error().to_string()));
            }

            let mac = hardware_address(device).unwrap_or([0; ETH_ALEN]);
            debug!(device, ifindex, mac = ?mac, "raw socket transport opened");

            Ok(Self {
                device: device.to_string(),
                fd,
                ifindex,
                mac,
            })
        }
    }

    impl FrameTransport for RawSocketTransport {
        fn device(&self) -> &str {
            &self.device
        }

        fn broadcast(&self, frame: &[u8]) -> SyncResult<()> {
            if frame.len() > MAX_FRAME_SIZE {
                return Err(SyncError::FrameTooLarge {
                    size: frame.len(),
                    max: MAX_FRAME_SIZE,
                });
            }

            let mut packet = BytesMut::with_capacity(ETH_HEADER_LEN + frame.len());
            packet.put_slice(&BROADCAST_MAC);
            packet.put_slice(&self.mac);
            packet.put_u16(ETHER_TYPE);
            packet.put_slice(frame);

            let addr = link_addr(self.ifindex, Some(BROADCAST_MAC));
            // SAFETY: `packet` outlives the call and `addr` is a fully
            // initialised `sockaddr_ll` of the length passed.
            let sent = unsafe {
                libc::sendto(
                    self.fd.as_raw_fd(),
                    packet.as_ptr() as *const libc::c_void,
                    packet.len(),
                    0,
                    &addr as *const libc::sockaddr_ll as *const libc::sockaddr,
                    mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
                )
            };
            if sent < 0 {
                return Err(io::Error::last_os_error().into());
            }
            trace!(device = %self.device, bytes = sent, "raw frame sent");
            Ok(())
        }

        fn receive_next(&self, timeout: Duration) -> SyncResult<Option<Vec<u8>>> {
            let mut pfd = libc::pollfd {
                fd: self.fd.as_raw_fd(),
                events: libc::POLLIN,
                revents: 0,
            };
            let timeout_ms = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
            // SAFETY: `pfd` is a valid single-element array.
            let ready = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
            if ready < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    return Ok(None);
                }
                return Err(err.into());
            }
            if ready == 0 {
                return Ok(None);
            }

            let mut buf = vec![0u8; RECV_BUFFER];
            // SAFETY: all-zero is a valid `sockaddr_ll`.
            let mut from: libc::sockaddr_ll = unsafe { mem::zeroed() };
            let mut from_len = mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t;
            // SAFETY: `buf` and `from` are writable for the lengths passed.
            let received = unsafe {
                libc::recvfrom(
                    self.fd.as_raw_fd(),
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                    0,
                    &mut from as *mut libc::sockaddr_ll as *mut libc::sockaddr,
                    &mut from_len,
                )
            };
            if received < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    return Ok(None);
                }
                return Err(err.into());
            }

            let received = received as usize;
            if from.sll_pkttype == PACKET_OUTGOING || received < ETH_HEADER_LEN {
                return Ok(None);
            }
            buf.truncate(received);
            Ok(Some(buf.split_off(ETH_HEADER_LEN)))
        }
    }

    fn link_addr(ifindex: libc::c_int, dest: Option<[u8; ETH_ALEN]>) -> libc::sockaddr_ll {
        // SAFETY: all-zero is a valid `sockaddr_ll`.
        let mut addr: libc::sockaddr_ll = unsafe { mem::zeroed() };
        addr.sll_family = libc::AF_PACKET as libc::c_ushort;
        addr.sll_protocol = ETHER_TYPE.to_be();
        addr.sll_ifindex = ifindex;
        if let Some(mac) = dest {
            addr.sll_halen = ETH_ALEN as libc::c_uchar;
            addr.sll_addr[..ETH_ALEN].copy_from_slice(&mac);
        }
        addr
    }

    fn hardware_address(device: &str) -> Option<[u8; ETH_ALEN]> {
        let text = std::fs::read_to_string(format!("/sys/class/net/{device}/address")).ok()?;
        let mut mac = [0u8; ETH_ALEN];
        let mut parts = text.trim().split(':');
        for byte in mac.iter_mut() {
            *byte = u8::from_str_radix(parts.next()?, 16).ok()?;
        }
        Some(mac)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn unknown_device_is_unavailable() {
            let err = RawSocketTransport::open("linkchain-no-such-if0")
                .err()
                .expect("device should not exist");
            assert!(matches!(
                err,
                SyncError::TransportUnavailable { ref device, .. } if device == "linkchain-no-such-if0"
            ));
        }

        #[test]
        fn nul_in_device_name_is_unavailable() {
            assert!(matches!(
                RawSocketTransport::open("eth\0"),
                Err(SyncError::TransportUnavailable { .. })
            ));
        }

        #[test]
        fn link_addr_targets_broadcast() {
            let addr = link_addr(3, Some(BROADCAST_MAC));
            assert_eq!(addr.sll_ifindex, 3);
            assert_eq!(addr.sll_halen, 6);
            assert_eq!(&addr.sll_addr[..6], &BROADCAST_MAC);
            assert_eq!(u16::from_be(addr.sll_protocol), ETHER_TYPE);
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod unsupported {
    use std::time::Duration;

    use crate::error::{SyncError, SyncResult};
    use crate::transport::FrameTransport;

    /// Placeholder on platforms without `AF_PACKET`; never opens.
    pub struct RawSocketTransport {
        device: String,
    }

    impl RawSocketTransport {
        pub fn open(device: &str) -> SyncResult<Self> {
            Err(SyncError::TransportUnavailable {
                device: device.to_string(),
                reason: "raw link-layer sockets are only supported on Linux".into(),
            })
        }
    }

    impl FrameTransport for RawSocketTransport {
        fn device(&self) -> &str {
            &self.device
        }

        fn broadcast(&self, _frame: &[u8]) -> SyncResult<()> {
            Err(SyncError::TransportClosed)
        }

        fn receive_next(&self, _timeout: Duration) -> SyncResult<Option<Vec<u8>>> {
            Err(SyncError::TransportClosed)
        }
    }
}
