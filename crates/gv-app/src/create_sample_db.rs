//! Create a sample SQLite table with demo data

use rusqlite::{params, Connection, Result};

/// Create and populate the sample table in an in-memory database
pub fn create_sample_database(rows: usize) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    
    conn.execute_batch(
        "
        CREATE TABLE sensor_telemetry (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            sensor_id TEXT,
            temperature REAL,
            humidity REAL,
            active BOOLEAN
        );
        "
    )?;
    
    generate_sensor_data(&conn, rows)?;
    Ok(conn)
}

fn generate_sensor_data(conn: &Connection, rows: usize) -> Result<()> {
    let sensors = ["TEMP_001", "TEMP_002", "HUMID_001", "PRESS_001"];
    let mut stmt = conn.prepare(
        "INSERT INTO sensor_telemetry (timestamp, sensor_id, temperature, humidity, active)
         VALUES (?1, ?2, ?3, ?4, ?5)"
    )?;
    
    for i in 0..rows {
        let timestamp = format!("2024-01-01 {:02}:{:02}:00", (i / 60) % 24, i % 60);
        let sensor_id = sensors[i % sensors.len()];
        let temperature = 20.0 + 5.0 * ((i as f64) * 0.1).sin();
        let humidity = 50.0 + 10.0 * ((i as f64) * 0.05).cos();
        stmt.execute(params![timestamp, sensor_id, temperature, humidity, i % 7 != 0])?;
    }
    
    Ok(())
}
