fn main() -> Result<(), Box<dyn std::error::Error>> {
    chatoyer::cli::main()
}
