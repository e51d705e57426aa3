//! L2CAP socket carrying ATT
//!
//! This module wraps a kernel `SOCK_SEQPACKET` L2CAP socket connected to the LE ATT fixed
//! channel. Each read returns exactly one PDU, which is what [`Transport`] expects.

use super::types::{BdAddr, L2capConfig, BDADDR_LE_PUBLIC};
use crate::att::constants::{ATT_CID, ATT_DEFAULT_MTU};
use crate::att::Transport;
use crate::error::TransportError;
use log::{debug, info, warn};
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

// Bluetooth socket constants
const AF_BLUETOOTH: i32 = 31;
const BTPROTO_L2CAP: i32 = 0;
const SOL_L2CAP: i32 = 6;
const L2CAP_OPTIONS: i32 = 0x01;

// Define the sockaddr_l2 structure
#[repr(C)]
#[allow(dead_code)]
pub(crate) struct SockaddrL2 {
    l2_family: libc::sa_family_t,
    l2_psm: u16,
    l2_bdaddr: [u8; 6],
    l2_cid: u16,
    l2_bdaddr_type: u8,
}

impl SockaddrL2 {
    fn att(bdaddr: BdAddr, bdaddr_type: u8) -> Self {
        Self {
            l2_family: AF_BLUETOOTH as libc::sa_family_t,
            l2_psm: 0,
            l2_bdaddr: bdaddr.bytes,
            l2_cid: ATT_CID.to_le(),
            l2_bdaddr_type: bdaddr_type,
        }
    }
}

// Define the l2cap_options structure
#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
pub(crate) struct L2capOptions {
    pub(crate) omtu: u16,
    pub(crate) imtu: u16,
    pub(crate) flush_to: u16,
    pub(crate) mode: u8,
    pub(crate) fcs: u8,
    pub(crate) max_tx: u8,
    pub(crate) txwin_size: u16,
}

/// A connected LE ATT channel
///
/// No Exchange MTU is performed, so the ATT MTU reported through [`Transport::mtu`] is always
/// the LE default of 23 bytes. The L2CAP link MTU read from the kernel is kept for diagnostics
/// only.
#[derive(Debug)]
pub struct L2capSocket {
    fd: RawFd,
    remote: BdAddr,
    link_mtu: Option<u16>,
}

impl L2capSocket {
    /// Connects to the ATT channel of `remote`
    pub fn connect(remote: BdAddr, config: &L2capConfig) -> Result<Self, TransportError> {
        let fd = unsafe { libc::socket(AF_BLUETOOTH, libc::SOCK_SEQPACKET, BTPROTO_L2CAP) };
        if fd < 0 {
            return Err(TransportError::SocketError(io::Error::last_os_error()));
        }

        // Closed on drop from here on
        let mut socket = L2capSocket::from_fd(fd, remote);

        let local = SockaddrL2::att(config.source, BDADDR_LE_PUBLIC);
        let result = unsafe {
            libc::bind(
                fd,
                &local as *const _ as *const libc::sockaddr,
                std::mem::size_of::<SockaddrL2>() as libc::socklen_t,
            )
        };
        if result < 0 {
            return Err(TransportError::BindError(io::Error::last_os_error()));
        }

        if let Some(timeout) = config.receive_timeout {
            socket.set_timeout(libc::SO_RCVTIMEO, timeout)?;
        }
        if let Some(timeout) = config.send_timeout {
            socket.set_timeout(libc::SO_SNDTIMEO, timeout)?;
        }

        debug!("Connecting to {} ({})", remote, config.address_type);
        let peer = SockaddrL2::att(remote, config.address_type.into());
        let result = unsafe {
            libc::connect(
                fd,
                &peer as *const _ as *const libc::sockaddr,
                std::mem::size_of::<SockaddrL2>() as libc::socklen_t,
            )
        };
        if result < 0 {
            return Err(TransportError::ConnectError(io::Error::last_os_error()));
        }

        match socket.read_options() {
            Ok(options) => socket.record_options(&options),
            Err(e) => warn!("Could not read L2CAP options: {}", e),
        }

        info!("Connected to {}, ATT MTU {}", remote, ATT_DEFAULT_MTU);
        Ok(socket)
    }

    /// Takes ownership of an already connected descriptor
    pub(crate) fn from_fd(fd: RawFd, remote: BdAddr) -> Self {
        L2capSocket {
            fd,
            remote,
            link_mtu: None,
        }
    }

    /// Address of the connected device
    pub fn remote(&self) -> BdAddr {
        self.remote
    }

    /// L2CAP MTU of the underlying link, if the kernel reported one
    ///
    /// This bounds what an Exchange MTU could negotiate. It is not the ATT MTU.
    pub fn link_mtu(&self) -> Option<u16> {
        self.link_mtu
    }

    pub(crate) fn record_options(&mut self, options: &L2capOptions) {
        debug!("L2CAP options: omtu = {}, imtu = {}", options.omtu, options.imtu);
        self.link_mtu = Some(options.omtu.min(options.imtu));
    }

    fn read_options(&self) -> io::Result<L2capOptions> {
        let mut options = L2capOptions::default();
        let mut len = std::mem::size_of::<L2capOptions>() as libc::socklen_t;
        let result = unsafe {
            libc::getsockopt(
                self.fd,
                SOL_L2CAP,
                L2CAP_OPTIONS,
                &mut options as *mut _ as *mut libc::c_void,
                &mut len,
            )
        };
        if result < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(options)
    }

    fn set_timeout(&mut self, option: libc::c_int, timeout: Duration) -> Result<(), TransportError> {
        let timeval = libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        };
        let result = unsafe {
            libc::setsockopt(
                self.fd,
                libc::SOL_SOCKET,
                option,
                &timeval as *const _ as *const libc::c_void,
                std::mem::size_of::<libc::timeval>() as libc::socklen_t,
            )
        };
        if result < 0 {
            return Err(TransportError::OptionError(io::Error::last_os_error()));
        }
        Ok(())
    }
}

impl Transport for L2capSocket {
    fn send(&mut self, pdu: &[u8]) -> Result<(), TransportError> {
        let written = unsafe { libc::write(self.fd, pdu.as_ptr() as *const libc::c_void, pdu.len()) };
        if written < 0 {
            return Err(TransportError::SendError(io::Error::last_os_error()));
        }
        if written as usize != pdu.len() {
            return Err(TransportError::ShortWrite {
                written: written as usize,
                expected: pdu.len(),
            });
        }
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let read = unsafe { libc::read(self.fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
        match read {
            r if r < 0 => Err(TransportError::ReceiveError(io::Error::last_os_error())),
            0 => Err(TransportError::Disconnected),
            r => Ok(r as usize),
        }
    }

    fn mtu(&self) -> u16 {
        ATT_DEFAULT_MTU
    }
}

impl AsRawFd for L2capSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for L2capSocket {
    fn drop(&mut self) {
        if unsafe { libc::close(self.fd) } < 0 {
            warn!(
                "Failed to close L2CAP socket to {}: {}",
                self.remote,
                io::Error::last_os_error()
            );
        }
    }
}
