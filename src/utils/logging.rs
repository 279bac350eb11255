#[cfg(feature = "logging")]
pub fn init_logger(
    min_level: log::LevelFilter, debug_file_name: &std::ffi::OsStr,
) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            // Local time only works on single-threaded processes, and the
            // samplers run on their own threads.
            let offset = time::OffsetDateTime::now_utc();
            let stamp = offset
                .format(&time::macros::format_description!(
                    // The weird "[[[" is because we need to escape a bracket ("[[") to show one "[".
                    // See https://time-rs.github.io/book/api/format-description.html
                    "[[[year]-[month]-[day]][[[hour]:[minute]:[second][subsecond digits:9]]"
                ))
                .unwrap_or_default();

            out.finish(format_args!(
                "{}[{}][{}] {}",
                stamp,
                record.target(),
                record.level(),
                message
            ))
        })
        .level(min_level)
        .chain(fern::log_file(debug_file_name)?)
        .apply()?;

    Ok(())
}
