//! Network configuration files written into a container rootfs.

use std::path::Path;

use quickbox_common::error::{QbError, Result};
use quickbox_core::probe;

/// Writes `/etc/hostname`, `/etc/hosts`, and substitutes the
/// `<hostname>` placeholder in the DHCP client configuration.
///
/// # Errors
///
/// Returns `DhcpConfigMissing` when neither of the two well-known
/// dhclient paths exists under the rootfs, or an I/O error if a write
/// fails.
pub fn write_network_configuration(rootfs: &Path, name: &str) -> Result<()> {
    probe::write_file_with_mode(&rootfs.join("etc/hostname"), name.as_bytes(), 0o644)?;
    probe::write_file_with_mode(
        &rootfs.join("etc/hosts"),
        format!("127.0.0.1 localhost {name}\n").as_bytes(),
        0o644,
    )?;

    let dhclient = rootfs.join("etc/dhcp/dhclient.conf");
    let dhclient3 = rootfs.join("etc/dhcp3/dhclient.conf");
    if probe::exists(&dhclient) {
        probe::replace_all_in_file(&dhclient, "<hostname>", name)
    } else if probe::exists(&dhclient3) {
        probe::replace_all_in_file(&dhclient3, "<hostname>", name)
    } else {
        Err(QbError::DhcpConfigMissing {
            rootfs: rootfs.to_path_buf(),
        })
    }
}

/// Writes the iptables restore pair: a filter/nat table accepting the
/// application port, and an `rc.local` that loads it at boot.
///
/// # Errors
///
/// Returns an error if either file cannot be written.
pub fn write_iptables(rootfs: &Path) -> Result<()> {
    probe::write_file_with_mode(
        &rootfs.join("root/iptables.conf"),
        b"*filter\n\
          :INPUT ACCEPT [0:0]\n\
          :FORWARD ACCEPT [0:0]\n\
          :OUTPUT ACCEPT [0:0]\n\
          -A INPUT -p tcp -m tcp --dport 8080 -j ACCEPT\n\
          COMMIT\n\
          *nat\n\
          :PREROUTING ACCEPT [0:0]\n\
          :INPUT ACCEPT [0:0]\n\
          :OUTPUT ACCEPT [0:0]\n\
          :POSTROUTING ACCEPT [0:0]\n\
          COMMIT\n",
        0o500,
    )?;
    probe::write_file_with_mode(
        &rootfs.join("etc/rc.local"),
        b"#!/bin/sh -e\n\
          /sbin/iptables-restore < /root/iptables.conf\n\
          exit 0\n",
        0o500,
    )
}
