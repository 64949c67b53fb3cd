pub mod any_date;
pub mod lat_lon;
