use loadblast::error::AppResult;

fn main() -> AppResult<()> {
    loadblast::entry::run()
}
