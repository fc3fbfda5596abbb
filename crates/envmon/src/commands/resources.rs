//! Zone, station, sensor, user and role commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;
use envmon_client::{
    Alert, DateRange, Reading, RoleInput, Sensor, SensorState, Station, StationInput, ZoneInput,
};

use super::{Context, or_dash, print_empty, print_field, print_header, print_success, truncate};

// ─────────────────────────────────────────────────────────────────────────────
// Zones
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for the zones command.
#[derive(Args, Debug)]
pub struct ZonesArgs {
    #[command(subcommand)]
    pub command: ZonesCommand,
}

#[derive(Subcommand, Debug)]
pub enum ZonesCommand {
    /// List all zones
    List,

    /// Show a specific zone
    Show {
        /// Zone ID
        id: u64,
    },

    /// Create a zone
    Create {
        /// Zone name
        name: String,

        /// Free-text description
        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(long, allow_hyphen_values = true)]
        latitude: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        longitude: Option<f64>,
    },

    /// Delete a zone
    Delete {
        /// Zone ID
        id: u64,
    },

    /// List the stations in a zone
    Stations {
        /// Zone ID
        id: u64,
    },
}

/// Run the zones command.
pub async fn zones(args: ZonesArgs, ctx: &Context) -> Result<()> {
    let api = ctx.client.zones();
    let dim = Style::new().dim();

    match args.command {
        ZonesCommand::List => {
            let zones = api.list().await?;
            if ctx.emit_json(&zones)? {
                return Ok(());
            }
            print_header("Zones");
            if zones.is_empty() {
                print_empty("zones");
            }
            for zone in &zones {
                println!(
                    "{} {}  {}",
                    dim.apply_to(format!("[{}]", zone.id)),
                    zone.name,
                    dim.apply_to(truncate(&zone.description, 50))
                );
            }
        }
        ZonesCommand::Show { id } => {
            let zone = api.get(id).await?;
            if ctx.emit_json(&zone)? {
                return Ok(());
            }
            print_header("Zone Details");
            print_field("ID", zone.id);
            print_field("Name", &zone.name);
            print_field("Description", &zone.description);
            print_field("Latitude", or_dash(zone.latitude));
            print_field("Longitude", or_dash(zone.longitude));
            print_field("Active", zone.is_active);
            print_field("Updated", &zone.updated_at);
        }
        ZonesCommand::Create {
            name,
            description,
            latitude,
            longitude,
        } => {
            let zone = api
                .create(&ZoneInput {
                    name,
                    description,
                    latitude,
                    longitude,
                    is_active: true,
                })
                .await?;
            if !ctx.emit_json(&zone)? {
                print_success(format!("Zone created: {}", dim.apply_to(zone.id)));
            }
        }
        ZonesCommand::Delete { id } => {
            api.delete(id).await?;
            if !ctx.emit_json(&serde_json::json!({ "deleted": id }))? {
                print_success(format!("Zone {} deleted", id));
            }
        }
        ZonesCommand::Stations { id } => {
            let stations = api.stations(id).await?;
            if !ctx.emit_json(&stations)? {
                print_header(&format!("Stations in zone {}", id));
                print_stations(&stations);
            }
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Stations
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for the stations command.
#[derive(Args, Debug)]
pub struct StationsArgs {
    #[command(subcommand)]
    pub command: StationsCommand,
}

#[derive(Subcommand, Debug)]
pub enum StationsCommand {
    /// List all stations
    List,

    /// Show a specific station
    Show {
        /// Station ID
        id: u64,
    },

    /// Create a station
    Create {
        /// Station name
        name: String,

        /// Zone the station belongs to
        #[arg(short, long)]
        zone: u64,

        /// Human-readable location
        #[arg(short, long, default_value = "")]
        location: String,

        #[arg(long, allow_hyphen_values = true)]
        latitude: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        longitude: Option<f64>,
    },

    /// Delete a station
    Delete {
        /// Station ID
        id: u64,
    },

    /// List the sensors at a station
    Sensors {
        /// Station ID
        id: u64,
    },
}

/// Run the stations command.
pub async fn stations(args: StationsArgs, ctx: &Context) -> Result<()> {
    let api = ctx.client.stations();
    let dim = Style::new().dim();

    match args.command {
        StationsCommand::List => {
            let stations = api.list().await?;
            if !ctx.emit_json(&stations)? {
                print_header("Stations");
                print_stations(&stations);
            }
        }
        StationsCommand::Show { id } => {
            let station = api.get(id).await?;
            if ctx.emit_json(&station)? {
                return Ok(());
            }
            print_header("Station Details");
            print_field("ID", station.id);
            print_field("Name", &station.name);
            print_field("Zone", station.zone);
            print_field("Location", &station.location);
            print_field("Latitude", or_dash(station.latitude));
            print_field("Longitude", or_dash(station.longitude));
            print_field("Active", station.is_active);
        }
        StationsCommand::Create {
            name,
            zone,
            location,
            latitude,
            longitude,
        } => {
            let station = api
                .create(&StationInput {
                    name,
                    location,
                    latitude,
                    longitude,
                    zone,
                    is_active: true,
                })
                .await?;
            if !ctx.emit_json(&station)? {
                print_success(format!("Station created: {}", dim.apply_to(station.id)));
            }
        }
        StationsCommand::Delete { id } => {
            api.delete(id).await?;
            if !ctx.emit_json(&serde_json::json!({ "deleted": id }))? {
                print_success(format!("Station {} deleted", id));
            }
        }
        StationsCommand::Sensors { id } => {
            let sensors = api.sensors(id).await?;
            if !ctx.emit_json(&sensors)? {
                print_header(&format!("Sensors at station {}", id));
                print_sensors(&sensors);
            }
        }
    }

    Ok(())
}

fn print_stations(stations: &[Station]) {
    let dim = Style::new().dim();
    if stations.is_empty() {
        print_empty("stations");
    }
    for station in stations {
        println!(
            "{} {}  {}",
            dim.apply_to(format!("[{}]", station.id)),
            station.name,
            dim.apply_to(format!("zone {} · {}", station.zone, station.location))
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sensors
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for the sensors command.
#[derive(Args, Debug)]
pub struct SensorsArgs {
    #[command(subcommand)]
    pub command: SensorsCommand,
}

#[derive(Subcommand, Debug)]
pub enum SensorsCommand {
    /// List all sensors
    List,

    /// Show a specific sensor
    Show {
        /// Sensor ID
        id: u64,
    },

    /// Delete a sensor
    Delete {
        /// Sensor ID
        id: u64,
    },

    /// List a sensor's readings
    Readings {
        /// Sensor ID
        id: u64,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Maximum readings to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List a sensor's alerts
    Alerts {
        /// Sensor ID
        id: u64,
    },
}

/// Run the sensors command.
pub async fn sensors(args: SensorsArgs, ctx: &Context) -> Result<()> {
    let api = ctx.client.sensors();

    match args.command {
        SensorsCommand::List => {
            let sensors = api.list().await?;
            if !ctx.emit_json(&sensors)? {
                print_header("Sensors");
                print_sensors(&sensors);
            }
        }
        SensorsCommand::Show { id } => {
            let sensor = api.get(id).await?;
            if ctx.emit_json(&sensor)? {
                return Ok(());
            }
            print_header("Sensor Details");
            print_field("ID", sensor.id);
            print_field("Type", &sensor.kind);
            print_field("Model", &sensor.model);
            print_field("Unit", &sensor.unit);
            print_field("Station", sensor.station);
            print_field("State", sensor_state_label(sensor.state));
            print_field("Installed", &sensor.installed_on);
            print_field("Calibrated", or_dash(sensor.last_calibrated_on.as_deref()));
            print_field(
                "Range",
                format!(
                    "{} .. {}",
                    or_dash(sensor.range_min),
                    or_dash(sensor.range_max)
                ),
            );
        }
        SensorsCommand::Delete { id } => {
            api.delete(id).await?;
            if !ctx.emit_json(&serde_json::json!({ "deleted": id }))? {
                print_success(format!("Sensor {} deleted", id));
            }
        }
        SensorsCommand::Readings {
            id,
            start,
            end,
            limit,
        } => {
            let range = DateRange {
                start_date: start,
                end_date: end,
                limit,
            };
            let readings = api.readings(id, &range).await?;
            if !ctx.emit_json(&readings)? {
                print_header(&format!("Readings for sensor {}", id));
                print_readings(&readings);
            }
        }
        SensorsCommand::Alerts { id } => {
            let alerts = api.alerts(id).await?;
            if !ctx.emit_json(&alerts)? {
                print_header(&format!("Alerts for sensor {}", id));
                print_alerts(&alerts);
            }
        }
    }

    Ok(())
}

fn print_sensors(sensors: &[Sensor]) {
    let dim = Style::new().dim();
    if sensors.is_empty() {
        print_empty("sensors");
    }
    for sensor in sensors {
        println!(
            "{} {} {}  {}",
            dim.apply_to(format!("[{}]", sensor.id)),
            sensor.kind,
            dim.apply_to(format!("({})", sensor.unit)),
            sensor_state_label(sensor.state)
        );
    }
}

pub(crate) fn sensor_state_label(state: SensorState) -> &'static str {
    match state {
        SensorState::Active => "active",
        SensorState::Inactive => "inactive",
        SensorState::Maintenance => "maintenance",
        SensorState::Calibration => "calibration",
    }
}

pub(crate) fn print_readings(readings: &[Reading]) {
    let dim = Style::new().dim();
    if readings.is_empty() {
        print_empty("readings");
    }
    for reading in readings {
        println!(
            "{} {}  sensor {}  {}",
            dim.apply_to(&reading.taken_at),
            reading.value,
            reading.sensor,
            dim.apply_to(format!("{:?}", reading.quality).to_lowercase())
        );
    }
}

pub(crate) fn print_alerts(alerts: &[Alert]) {
    let dim = Style::new().dim();
    let green = Style::new().green();
    let red = Style::new().red();
    if alerts.is_empty() {
        print_empty("alerts");
    }
    for alert in alerts {
        let mark = if alert.attended {
            green.apply_to("✓")
        } else {
            red.apply_to("●")
        };
        println!(
            "{} {} {} {}  {}",
            mark,
            dim.apply_to(format!("[{}]", alert.id)),
            format!("{:?}", alert.level).to_uppercase(),
            alert.kind,
            dim.apply_to(truncate(&alert.description, 50))
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for the users command.
#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List all users
    List,

    /// Show a specific user
    Show {
        /// User ID
        id: u64,
    },

    /// Delete a user
    Delete {
        /// User ID
        id: u64,
    },

    /// List a user's role assignments
    Roles {
        /// User ID
        id: u64,
    },

    /// Assign a role to a user
    AssignRole {
        /// User ID
        user: u64,

        /// Role ID
        role: u64,
    },

    /// Remove a role assignment
    RemoveRole {
        /// Assignment ID (from `users roles`)
        assignment: u64,
    },
}

/// Run the users command.
pub async fn users(args: UsersArgs, ctx: &Context) -> Result<()> {
    let api = ctx.client.users();
    let dim = Style::new().dim();

    match args.command {
        UsersCommand::List => {
            let users = api.list().await?;
            if ctx.emit_json(&users)? {
                return Ok(());
            }
            print_header("Users");
            if users.is_empty() {
                print_empty("users");
            }
            for user in &users {
                println!(
                    "{} {}  {}",
                    dim.apply_to(format!("[{}]", user.id)),
                    user.username,
                    dim.apply_to(&user.email)
                );
            }
        }
        UsersCommand::Show { id } => {
            let user = api.get(id).await?;
            if ctx.emit_json(&user)? {
                return Ok(());
            }
            print_header("User Details");
            print_field("ID", user.id);
            print_field("Username", &user.username);
            print_field("Name", format!("{} {}", user.first_name, user.last_name).trim());
            print_field("Email", &user.email);
            print_field(
                "State",
                or_dash(user.account_state.map(|s| format!("{:?}", s).to_lowercase())),
            );
            print_field("Registered", or_dash(user.registered_at.as_deref()));
        }
        UsersCommand::Delete { id } => {
            api.delete(id).await?;
            if !ctx.emit_json(&serde_json::json!({ "deleted": id }))? {
                print_success(format!("User {} deleted", id));
            }
        }
        UsersCommand::Roles { id } => {
            let assignments = api.roles(id).await?;
            if ctx.emit_json(&assignments)? {
                return Ok(());
            }
            print_header(&format!("Roles of user {}", id));
            if assignments.is_empty() {
                print_empty("role assignments");
            }
            for assignment in &assignments {
                println!(
                    "{} role {}",
                    dim.apply_to(format!("[{}]", assignment.id)),
                    assignment.role
                );
            }
        }
        UsersCommand::AssignRole { user, role } => {
            let assignment = api.assign_role(user, role).await?;
            if !ctx.emit_json(&assignment)? {
                print_success(format!(
                    "Role {} assigned to user {} {}",
                    role,
                    user,
                    dim.apply_to(format!("(assignment {})", assignment.id))
                ));
            }
        }
        UsersCommand::RemoveRole { assignment } => {
            api.remove_role(assignment).await?;
            if !ctx.emit_json(&serde_json::json!({ "deleted": assignment }))? {
                print_success(format!("Role assignment {} removed", assignment));
            }
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for the roles command.
#[derive(Args, Debug)]
pub struct RolesArgs {
    #[command(subcommand)]
    pub command: RolesCommand,
}

#[derive(Subcommand, Debug)]
pub enum RolesCommand {
    /// List all roles
    List,

    /// Create a role
    Create {
        /// Role name
        name: String,

        /// Free-text description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Delete a role
    Delete {
        /// Role ID
        id: u64,
    },
}

/// Run the roles command.
pub async fn roles(args: RolesArgs, ctx: &Context) -> Result<()> {
    let api = ctx.client.roles();
    let dim = Style::new().dim();

    match args.command {
        RolesCommand::List => {
            let roles = api.list().await?;
            if ctx.emit_json(&roles)? {
                return Ok(());
            }
            print_header("Roles");
            if roles.is_empty() {
                print_empty("roles");
            }
            for role in &roles {
                println!(
                    "{} {}  {}",
                    dim.apply_to(format!("[{}]", role.id)),
                    role.name,
                    dim.apply_to(truncate(&role.description, 50))
                );
            }
        }
        RolesCommand::Create { name, description } => {
            let role = api
                .create(&RoleInput {
                    name,
                    description,
                    is_active: true,
                })
                .await?;
            if !ctx.emit_json(&role)? {
                print_success(format!("Role created: {}", dim.apply_to(role.id)));
            }
        }
        RolesCommand::Delete { id } => {
            api.delete(id).await?;
            if !ctx.emit_json(&serde_json::json!({ "deleted": id }))? {
                print_success(format!("Role {} deleted", id));
            }
        }
    }

    Ok(())
}
