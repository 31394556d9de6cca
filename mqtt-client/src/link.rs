use std::collections::HashSet;

/// The physical link capability — bring-up/tear-down of the underlying
/// network interface. On a hosted platform this is typically a no-op; on an
/// embedded target it drives Wi-Fi/cellular association.
pub trait LinkInterface {
    #[allow(async_fn_in_trait)]
    async fn up(&mut self) -> std::io::Result<()>;
    #[allow(async_fn_in_trait)]
    async fn down(&mut self);
    fn is_connected(&self) -> bool;
    fn busy_error_set(&self) -> &HashSet<i32> {
        static EMPTY: std::sync::LazyLock<HashSet<i32>> = std::sync::LazyLock::new(HashSet::new);
        &EMPTY
    }
}

/// Best-effort internet-reachability probe: resolves `host` and returns
/// whether the lookup succeeded. A link can report `is_connected() == true`
/// while still having no route to the broker's network (association without
/// a working DHCP lease or upstream route); this lets a supervisor widen its
/// stability check beyond the link layer alone.
pub async fn wan_ok(host: &str) -> bool {
    tokio::net::lookup_host((host, 0)).await.is_ok()
}

/// A link that is always up — the host's own network stack is the link.
/// Suitable wherever the device is already attached to a network (desktops,
/// servers, containers) and there is no separate interface to bring up.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysUpLink;

impl LinkInterface for AlwaysUpLink {
    async fn up(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    async fn down(&mut self) {}

    fn is_connected(&self) -> bool {
        true
    }
}
