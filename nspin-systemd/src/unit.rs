//! Unit file rendering

use nspin_core::{NamespaceName, TargetConfig};
use nspin_netns::Ip;
use std::path::Path;

/// Name of the unit that persists `namespace`
#[must_use]
pub fn unit_name(namespace: &NamespaceName) -> String {
    format!("{namespace}-netns.service")
}

/// A rendered unit: its name and exact file contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFile {
    name: String,
    body: String,
}

impl UnitFile {
    /// Render the unit for a target
    ///
    /// Commands run at boot use `ip_path` as given; the commands nested in
    /// `ip netns exec` are resolved through `PATH` inside the namespace.
    #[must_use]
    pub fn render(target: &TargetConfig, ip_path: &Path) -> Self {
        let ns = &target.namespace;
        let iface = &target.interface;
        let ip = Ip::new(ip_path.display().to_string());
        let inner = Ip::default();

        let exec_start = ip.netns_add(ns);
        let exec_start_post = [
            ip.link_set_netns(iface, ns),
            ip.netns_exec(ns, &inner.link_up(iface.as_str())),
            ip.netns_exec(ns, &inner.link_up("lo")),
            ip.netns_exec(ns, &inner.addr_add(&target.address, iface)),
            ip.netns_exec(ns, &inner.route_add_default(target.gateway)),
        ];

        let mut lines = vec![
            "[Unit]".to_string(),
            format!("Description=Persistent netns setup for {ns}"),
            "After=network.target".to_string(),
            String::new(),
            "[Service]".to_string(),
            "Type=oneshot".to_string(),
            format!("ExecStart={exec_start}"),
        ];
        lines.extend(exec_start_post.iter().map(|cmd| format!("ExecStartPost={cmd}")));
        lines.extend(
            [
                "RemainAfterExit=yes",
                "",
                "[Install]",
                "WantedBy=multi-user.target",
                "",
            ]
            .map(String::from),
        );

        let body = lines.join("\n");

        Self {
            name: unit_name(ns),
            body,
        }
    }

    /// Unit name, e.g. `ha-test-netns.service`
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File contents
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_BODY: &str = "\
[Unit]
Description=Persistent netns setup for ha-test
After=network.target

[Service]
Type=oneshot
ExecStart=/usr/sbin/ip netns add ha-test
ExecStartPost=/usr/sbin/ip link set dev ha-0-0 netns ha-test
ExecStartPost=/usr/sbin/ip netns exec ha-test ip link set ha-0-0 up
ExecStartPost=/usr/sbin/ip netns exec ha-test ip link set lo up
ExecStartPost=/usr/sbin/ip netns exec ha-test ip addr add 2.2.2.3/24 dev ha-0-0
ExecStartPost=/usr/sbin/ip netns exec ha-test ip route add default via 2.2.2.2
RemainAfterExit=yes

[Install]
WantedBy=multi-user.target
";

    #[test]
    fn test_render_default_target() {
        let unit = UnitFile::render(&TargetConfig::default(), Path::new("/usr/sbin/ip"));

        assert_eq!(unit.name(), "ha-test-netns.service");
        assert_eq!(unit.body(), DEFAULT_BODY);
    }

    #[test]
    fn test_render_is_deterministic() {
        let target = TargetConfig::default();
        let a = UnitFile::render(&target, Path::new("/usr/sbin/ip"));
        let b = UnitFile::render(&target, Path::new("/usr/sbin/ip"));

        assert_eq!(a, b);
    }

    fn changed_lines(target: &TargetConfig) -> Vec<(String, String)> {
        let before = UnitFile::render(&TargetConfig::default(), Path::new("/usr/sbin/ip"));
        let after = UnitFile::render(target, Path::new("/usr/sbin/ip"));

        assert_eq!(before.body().lines().count(), after.body().lines().count());
        before
            .body()
            .lines()
            .zip(after.body().lines())
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_gateway_change_touches_one_line() {
        let target = TargetConfig::default().with_gateway("2.2.2.1".parse().unwrap());

        assert_eq!(
            changed_lines(&target),
            vec![(
                "ExecStartPost=/usr/sbin/ip netns exec ha-test ip route add default via 2.2.2.2".to_string(),
                "ExecStartPost=/usr/sbin/ip netns exec ha-test ip route add default via 2.2.2.1".to_string(),
            )]
        );
    }

    #[test]
    fn test_address_change_touches_one_line() {
        let target = TargetConfig::default().with_address("2.2.2.4/24".parse().unwrap());

        assert_eq!(
            changed_lines(&target),
            vec![(
                "ExecStartPost=/usr/sbin/ip netns exec ha-test ip addr add 2.2.2.3/24 dev ha-0-0".to_string(),
                "ExecStartPost=/usr/sbin/ip netns exec ha-test ip addr add 2.2.2.4/24 dev ha-0-0".to_string(),
            )]
        );
    }

    #[test]
    fn test_interface_change_touches_interface_lines() {
        let target = TargetConfig::default().with_interface("ha-0-1".parse().unwrap());

        let changed = changed_lines(&target);

        assert_eq!(changed.len(), 3);
        assert_eq!(
            changed.iter().map(|(_, after)| after.as_str()).collect::<Vec<_>>(),
            vec![
                "ExecStartPost=/usr/sbin/ip link set dev ha-0-1 netns ha-test",
                "ExecStartPost=/usr/sbin/ip netns exec ha-test ip link set ha-0-1 up",
                "ExecStartPost=/usr/sbin/ip netns exec ha-test ip addr add 2.2.2.3/24 dev ha-0-1",
            ]
        );
    }

    #[test]
    fn test_custom_ip_path() {
        let unit = UnitFile::render(&TargetConfig::default(), Path::new("/sbin/ip"));

        assert!(unit.body().contains("ExecStart=/sbin/ip netns add ha-test\n"));
        assert!(!unit.body().contains("/usr/sbin/ip"));
    }
}
