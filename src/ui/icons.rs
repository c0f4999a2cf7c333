pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const WARN: &str = "⚠️";
    pub const LINK: &str = "🔗";
    pub const PACKAGE: &str = "📦";
    pub const DATABASE: &str = "🗄️";
    pub const RISK_HIGH: &str = "🔴";
    pub const RISK_MEDIUM: &str = "🟠";
    pub const RISK_LOW: &str = "🟢";
}
