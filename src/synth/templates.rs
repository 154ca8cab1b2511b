//! Fixed artifact templates.
//!
//! Text blocks that are emitted verbatim (or with trivial substitution) into
//! the generated lab: the FRR credential preamble, the daemon enablement
//! file, startup script tails and the placeholder web document.

/// Fixed frr.conf preamble: credential placeholders and log destination
pub const FRR_PREAMBLE: &str = "password zebra
enable password zebra

log file /var/log/frr/frr.log
";

/// Global BGP debug lines, emitted right after the preamble when BGP is on
pub const BGP_DEBUG: &str = "debug bgp keepalives
debug bgp updates in
debug bgp updates out
";

/// Placeholder document served by web-server nodes
pub const WWW_INDEX: &str =
    "<html><head><title>www</title></head><body><h1>Server WWW</h1></body></html>";

const DAEMONS_TAIL: &str = "
ospf6d=no
ripngd=no
isisd=no
pimd=no
ldpd=no
nhrpd=no
eigrpd=no
babeld=no
sharpd=no
staticd=no
pbrd=no
bfdd=no
fabricd=no

######

vtysh_enable=yes
zebra_options=\" -s 90000000 --daemon -A 127.0.0.1\"
bgpd_options=\"   --daemon -A 127.0.0.1\"
ospfd_options=\"  --daemon -A 127.0.0.1\"
ospf6d_options=\" --daemon -A ::1\"
ripd_options=\"   --daemon -A 127.0.0.1\"
ripngd_options=\" --daemon -A ::1\"
isisd_options=\"  --daemon -A 127.0.0.1\"
pimd_options=\"  --daemon -A 127.0.0.1\"
ldpd_options=\"  --daemon -A 127.0.0.1\"
nhrpd_options=\"  --daemon -A 127.0.0.1\"
eigrpd_options=\"  --daemon -A 127.0.0.1\"
babeld_options=\"  --daemon -A 127.0.0.1\"
sharpd_options=\"  --daemon -A 127.0.0.1\"
staticd_options=\"  --daemon -A 127.0.0.1\"
pbrd_options=\"  --daemon -A 127.0.0.1\"
bfdd_options=\"  --daemon -A 127.0.0.1\"
fabricd_options=\"  --daemon -A 127.0.0.1\"
";

/// Render the daemon enablement file. zebra is always on; the routing
/// daemons follow the router's protocol set.
pub fn daemons_file(bgp: bool, ospf: bool, rip: bool) -> String {
    let flag = |enabled: bool| if enabled { "yes" } else { "no" };
    format!(
        "zebra=yes\nripd={}\nospfd={}\nbgpd={}\n{}",
        flag(rip),
        flag(ospf),
        flag(bgp),
        DAEMONS_TAIL
    )
}

/// Render vtysh.conf for a router.
pub fn vtysh_conf(router_name: &str) -> String {
    format!(
        "service integrated-vtysh-config\nhostname {}-frr\n",
        router_name
    )
}
