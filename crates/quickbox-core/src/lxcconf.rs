//! Container configuration rendering.
//!
//! Configuration is a mapping from a closed key vocabulary to ordered
//! value lists. Rendering validates every key against the allow-list and
//! emits `key = value` lines in allow-list order, one line per value, so
//! the output is deterministic for a given mapping.

use std::collections::HashMap;
use std::path::Path;

use quickbox_common::error::{QbError, Result};

/// The closed allow-list of configuration keys, in rendering order.
pub const CONFIG_KEYS: [&str; 54] = [
    "lxc.utsname",
    "lxc.tty",
    "lxc.pts",
    "lxc.devttydir",
    "lxc.rootfs",
    "lxc.rootfs.mount",
    "lxc.mount",
    "lxc.arch",
    "lxc.cap.drop",
    "lxc.pivotdir",
    "lxc.network.type",
    "lxc.network.flags",
    "lxc.network.name",
    "lxc.network.link",
    "lxc.network.macvlan.mode",
    "lxc.network.hwaddr",
    "lxc.network.ipv4",
    "lxc.network.ipv4.gateway",
    "lxc.network.ipv6",
    "lxc.network.ipv6.gateway",
    "lxc.network.vlan.id",
    "lxc.network.mtu",
    "lxc.network.script.up",
    "lxc.network.veth.pair",
    "lxc.cgroup.devices.deny",
    "lxc.cgroup.devices.allow",
    "lxc.cgroup.cpu.shares",
    "lxc.cgroup.memory.force_empty",
    "lxc.cgroup.memory.limit_in_bytes",
    "lxc.cgroup.memory.memsw.limit_in_bytes",
    "lxc.cgroup.memory.move_charge_at_immigrate",
    "lxc.cgroup.memory.oom_control",
    "lxc.cgroup.memory.soft_limit_in_bytes",
    "lxc.cgroup.memory.swappiness",
    "lxc.cgroup.memory.usage_in_bytes",
    "lxc.cgroup.memory.use_hierarchy",
    "lxc.cgroup.cpuset.cpu_exclusive",
    "lxc.cgroup.cpuset.cpus",
    "lxc.cgroup.cpuset.mem_exclusive",
    "lxc.cgroup.cpuset.mem_hardwall",
    "lxc.cgroup.cpuset.memory_migrate",
    "lxc.cgroup.cpuset.memory_spread_page",
    "lxc.cgroup.cpuset.memory_spread_slab",
    "lxc.cgroup.cpuset.mems",
    "lxc.cgroup.cpuset.sched_load_balance",
    "lxc.cgroup.cpuset.sched_relax_domain_level",
    "lxc.cgroup.blkio.reset_stats",
    "lxc.cgroup.blkio.sectors",
    "lxc.cgroup.blkio.throttle.read_bps_device",
    "lxc.cgroup.blkio.throttle.read_iops_device",
    "lxc.cgroup.blkio.throttle.write_bps_device",
    "lxc.cgroup.blkio.throttle.write_iops_device",
    "lxc.cgroup.blkio.weight",
    "lxc.cgroup.blkio.weight_device",
];

/// A container configuration mapping: key → ordered list of values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CgroupInfo {
    entries: HashMap<String, Vec<String>>,
}

impl CgroupInfo {
    /// Creates an empty configuration mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value to a key's list, creating the list if needed.
    ///
    /// Keys are not validated here; validation happens at render time so
    /// the error can name every offending key consistently.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// Replaces a key's value list wholesale.
    pub fn set(&mut self, key: impl Into<String>, values: Vec<String>) {
        let _ = self.entries.insert(key.into(), values);
    }

    /// Returns the value list for a key, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Renders the configuration to bytes, one `key = value` line per
    /// value, in allow-list order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfigKey` if any key is outside the allow-list.
    pub fn render(&self) -> Result<Vec<u8>> {
        for key in self.entries.keys() {
            if !CONFIG_KEYS.contains(&key.as_str()) {
                return Err(QbError::InvalidConfigKey { key: key.clone() });
            }
        }
        let mut out = String::new();
        for key in CONFIG_KEYS {
            if let Some(values) = self.entries.get(key) {
                for value in values {
                    out.push_str(key);
                    out.push_str(" = ");
                    out.push_str(value);
                    out.push('\n');
                }
            }
        }
        Ok(out.into_bytes())
    }
}

/// Returns the default configuration for a container: hostname, tty and
/// pts counts, rootfs and mount table, amd64, `sys_module` dropped, a
/// bridged veth, and the standard device allow-list.
#[must_use]
pub fn default_cgroup_info(name: &str, rootfs: &Path, fstab: &Path) -> CgroupInfo {
    let mut info = CgroupInfo::new();
    info.push("lxc.utsname", name);
    info.push("lxc.tty", "4");
    info.push("lxc.pts", "1024");
    info.push("lxc.rootfs", rootfs.display().to_string());
    info.push("lxc.mount", fstab.display().to_string());
    info.push("lxc.arch", "amd64");
    info.push("lxc.cap.drop", "sys_module");
    info.push("lxc.network.type", "veth");
    info.push("lxc.network.flags", "up");
    info.push("lxc.network.name", "eth0");
    info.push("lxc.network.link", "br0");
    info.push("lxc.network.ipv4", "0.0.0.0");
    info.push("lxc.cgroup.devices.deny", "a");
    // mknod of any node, without use of it
    for allow in ["c *:* m", "b *:* m"] {
        info.push("lxc.cgroup.devices.allow", allow);
    }
    // null, zero, consoles, ttys, random, urandom, pts, console, rtc,
    // fuse, tun
    for allow in [
        "c 1:3 rwm",
        "c 1:5 rwm",
        "c 5:1 rwm",
        "c 5:0 rwm",
        "c 4:0 rwm",
        "c 4:1 rwm",
        "c 1:9 rwm",
        "c 1:8 rwm",
        "c 136:* rwm",
        "c 5:2 rwm",
        "c 254:0 rwm",
        "c 10:229 rwm",
        "c 10:200 rwm",
    ] {
        info.push("lxc.cgroup.devices.allow", allow);
    }
    info
}

/// Returns the contents of a container's mount table: proc and sysfs
/// entries bound under the given rootfs.
#[must_use]
pub fn fstab_contents(rootfs: &Path) -> String {
    format!(
        "proc {rootfs}/proc proc nodev,noexec,nosuid 0 0\n\
         sysfs {rootfs}/sys sysfs defaults 0 0\n",
        rootfs = rootfs.display()
    )
}
